use multilens_core::form::{validate_sentiment_text, Mode};
use multilens_core::inference::parse_sentiment;
use serde_json::Value;

use super::{shape_error, AnalysisError, AnalysisOutput, Analyzer};
use crate::dispatch::InferenceDispatch;

impl<D: InferenceDispatch> Analyzer<D> {
    pub fn analyze_sentiment(&self, text: &str) -> Result<AnalysisOutput, AnalysisError> {
        let text = validate_sentiment_text(text)?;
        let model = self.routes().sentiment_model().to_string();
        let value = self.call_model(Mode::Sentiment, &model, Value::String(text.to_string()))?;
        let emotion = parse_sentiment(&value).map_err(shape_error(Mode::Sentiment))?;
        log::debug!(
            "event=sentiment_detected label={} score={:.4}",
            emotion.label,
            emotion.score
        );
        Ok(AnalysisOutput {
            mode: Mode::Sentiment,
            model,
            headline: "Detected Emotion".to_string(),
            text: emotion.label,
        })
    }
}
