//! Shapes of hosted inference responses.
//!
//! Only the keys the form displays are checked; everything else in the
//! payload is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const NO_TEXT_RECOGNIZED: &str = "No text recognized";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseShapeError {
    #[error("translation response has no `translation_text` in its first element")]
    MissingTranslation,
    #[error("image-to-text response has no `generated_text`")]
    MissingGeneratedText,
    #[error("transcription response is not an object")]
    InvalidTranscription,
    #[error("Invalid emotions data structure!")]
    InvalidEmotions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    pub label: String,
    pub score: f64,
}

/// `{"error": "..."}` bodies are how hosted models report loading or bad input.
pub fn remote_error(value: &Value) -> Option<String> {
    let err = value.as_object()?.get("error")?;
    match err {
        Value::String(message) => Some(message.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

pub fn parse_translation(value: &Value) -> Result<String, ResponseShapeError> {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.get("translation_text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ResponseShapeError::MissingTranslation)
}

pub fn parse_transcription(value: &Value) -> Result<String, ResponseShapeError> {
    let object = value
        .as_object()
        .ok_or(ResponseShapeError::InvalidTranscription)?;
    Ok(object
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or(NO_TEXT_RECOGNIZED)
        .to_string())
}

pub fn parse_image_text(value: &Value) -> Result<String, ResponseShapeError> {
    let holder = match value {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(value),
        _ => None,
    };
    holder
        .and_then(|item| item.get("generated_text"))
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .ok_or(ResponseShapeError::MissingGeneratedText)
}

fn collect_emotions(value: &Value, out: &mut Vec<Emotion>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_emotions(item, out);
            }
        }
        Value::Object(object) => {
            let label = object.get("label").and_then(Value::as_str);
            let score = object.get("score").and_then(Value::as_f64);
            if let (Some(label), Some(score)) = (label, score) {
                out.push(Emotion {
                    label: label.to_string(),
                    score,
                });
            }
        }
        _ => {}
    }
}

/// Flattens nested `[[{label, score}, ..]]` results and keeps the highest score.
/// The first entry wins a tie.
pub fn parse_sentiment(value: &Value) -> Result<Emotion, ResponseShapeError> {
    if !value.is_array() {
        return Err(ResponseShapeError::InvalidEmotions);
    }
    let mut emotions = Vec::new();
    collect_emotions(value, &mut emotions);
    let mut best: Option<Emotion> = None;
    for emotion in emotions {
        match &best {
            Some(current) if emotion.score <= current.score => {}
            _ => best = Some(emotion),
        }
    }
    best.ok_or(ResponseShapeError::InvalidEmotions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn translation_reads_first_element() {
        let value = json!([{ "translation_text": "Bonjour" }, { "translation_text": "Salut" }]);
        assert_eq!(parse_translation(&value).as_deref(), Ok("Bonjour"));
        assert_eq!(
            parse_translation(&json!([])),
            Err(ResponseShapeError::MissingTranslation)
        );
        assert_eq!(
            parse_translation(&json!({ "translation_text": "x" })),
            Err(ResponseShapeError::MissingTranslation)
        );
    }

    #[test]
    fn remote_error_detects_error_objects() {
        assert_eq!(
            remote_error(&json!({ "error": "Model is currently loading", "estimated_time": 20.0 })),
            Some("Model is currently loading".to_string())
        );
        assert_eq!(remote_error(&json!({ "error": ["a", "b"] })), Some("[\"a\",\"b\"]".to_string()));
        assert_eq!(remote_error(&json!([{ "error": "nested" }])), None);
        assert_eq!(remote_error(&json!({ "text": "ok" })), None);
    }

    #[test]
    fn transcription_defaults_when_text_missing() {
        assert_eq!(
            parse_transcription(&json!({ "text": " hello world" })).as_deref(),
            Ok(" hello world")
        );
        assert_eq!(
            parse_transcription(&json!({ "chunks": [] })).as_deref(),
            Ok(NO_TEXT_RECOGNIZED)
        );
        assert!(parse_transcription(&json!(["text"])).is_err());
    }

    #[test]
    fn image_text_accepts_list_or_object() {
        assert_eq!(
            parse_image_text(&json!([{ "generated_text": "INVOICE 42 \n" }])).as_deref(),
            Ok("INVOICE 42")
        );
        assert_eq!(
            parse_image_text(&json!({ "generated_text": "stop" })).as_deref(),
            Ok("stop")
        );
        assert!(parse_image_text(&json!([])).is_err());
    }

    #[test]
    fn sentiment_picks_max_score_across_flattened_result() {
        let value = json!([[
            { "label": "anger", "score": 0.01 },
            { "label": "joy", "score": 0.91 },
            { "label": "sadness", "score": 0.05 }
        ], [
            { "label": "surprise", "score": 0.02 }
        ]]);
        let emotion = parse_sentiment(&value).expect("emotion");
        assert_eq!(emotion.label, "joy");
    }

    #[test]
    fn sentiment_tie_keeps_first() {
        let value = json!([[
            { "label": "neutral", "score": 0.5 },
            { "label": "joy", "score": 0.5 }
        ]]);
        assert_eq!(parse_sentiment(&value).expect("emotion").label, "neutral");
    }

    #[test]
    fn sentiment_rejects_unexpected_structure() {
        assert_eq!(
            parse_sentiment(&json!({ "label": "joy", "score": 1.0 })),
            Err(ResponseShapeError::InvalidEmotions)
        );
        assert_eq!(
            parse_sentiment(&json!([[]])),
            Err(ResponseShapeError::InvalidEmotions)
        );
        assert_eq!(
            parse_sentiment(&json!([[{ "label": "joy" }]])),
            Err(ResponseShapeError::InvalidEmotions)
        );
    }
}
