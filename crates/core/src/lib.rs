pub mod form;
pub mod inference;
pub mod languages;
pub mod routing;

pub use form::{FormError, Mode, Upload};
pub use inference::{Emotion, ResponseShapeError};
pub use languages::Language;
pub use routing::ModelRoutes;
