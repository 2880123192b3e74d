//! The four form operations: validate, resolve the model, dispatch, read the answer.

mod media;
mod sentiment;
mod translate;

use std::fmt;

use multilens_core::form::{FormError, Mode};
use multilens_core::inference::{remote_error, ResponseShapeError};
use multilens_core::routing::ModelRoutes;
use serde_json::Value;
use thiserror::Error;

use crate::dispatch::{Dispatcher, InferenceDispatch};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
    pub mode: Mode,
    pub model: String,
    pub headline: String,
    pub text: String,
}

impl fmt::Display for AnalysisOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.headline, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("{}", .mode.unavailable_message())]
    Unavailable { mode: Mode },
    #[error("{}: {message}", remote_error_prefix(.mode))]
    Remote { mode: Mode, message: String },
    #[error("{}", shape_error_message(.mode, .source))]
    Shape {
        mode: Mode,
        source: ResponseShapeError,
    },
}

impl AnalysisError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AnalysisError::Form(_))
    }
}

fn remote_error_prefix(mode: &Mode) -> &'static str {
    match mode {
        Mode::Translation => "Error during translation",
        Mode::ImageOcr => "Error during text extraction",
        Mode::AudioToText => "Error during transcription",
        Mode::Sentiment => "Error during sentiment analysis",
    }
}

fn shape_error_message(mode: &Mode, source: &ResponseShapeError) -> String {
    match mode {
        Mode::Sentiment => source.to_string(),
        _ => format!("Unexpected response from the model: {source}"),
    }
}

pub struct Analyzer<D = Dispatcher> {
    dispatcher: D,
    routes: ModelRoutes,
}

impl Analyzer<Dispatcher> {
    pub fn from_env() -> Self {
        Self::new(
            Dispatcher::from_env(),
            crate::runtime_config::model_routes_from_env(),
        )
    }
}

impl<D: InferenceDispatch> Analyzer<D> {
    pub fn new(dispatcher: D, routes: ModelRoutes) -> Self {
        Self { dispatcher, routes }
    }

    pub fn routes(&self) -> &ModelRoutes {
        &self.routes
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Dispatches and screens out the failure marker and `{"error": ..}` bodies.
    fn call_model(&self, mode: Mode, model: &str, payload: Value) -> Result<Value, AnalysisError> {
        log::info!("event=analysis_dispatch mode={} model={}", mode.slug(), model);
        let Some(value) = self.dispatcher.dispatch(model, payload) else {
            return Err(AnalysisError::Unavailable { mode });
        };
        if let Some(message) = remote_error(&value) {
            log::warn!(
                "event=analysis_remote_error mode={} model={} err={}",
                mode.slug(),
                model,
                message
            );
            return Err(AnalysisError::Remote { mode, message });
        }
        Ok(value)
    }
}

fn shape_error(mode: Mode) -> impl FnOnce(ResponseShapeError) -> AnalysisError {
    move |source| AnalysisError::Shape { mode, source }
}
