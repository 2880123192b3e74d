//! Endpoint routing: which hosted model serves each analysis.
//!
//! The table is plain configuration. Defaults cover the opus-mt pairs the
//! form offers; deployments override entries through
//! [`ModelRoutes::apply_translation_overrides`] and the single-route setters.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::languages::Language;

pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "openai/whisper-large-v2";
pub const DEFAULT_SENTIMENT_MODEL: &str = "j-hartmann/emotion-english-distilroberta-base";
pub const DEFAULT_OCR_MODEL: &str = "microsoft/trocr-base-printed";

const FROM_ENGLISH: [Language; 8] = [
    Language::French,
    Language::Spanish,
    Language::German,
    Language::Italian,
    Language::Russian,
    Language::Chinese,
    Language::Japanese,
    Language::Hindi,
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteParseError {
    #[error("invalid translation route `{0}`; expected Source>Target=model")]
    Malformed(String),
    #[error("unknown language `{language}` in translation route `{entry}`")]
    UnknownLanguage { entry: String, language: String },
    #[error("translation route `{0}` maps a language to itself")]
    SamePair(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRoutes {
    translation: BTreeMap<(Language, Language), String>,
    transcription: String,
    ocr: String,
    sentiment: String,
}

impl Default for ModelRoutes {
    fn default() -> Self {
        let mut translation = BTreeMap::new();
        for target in FROM_ENGLISH {
            translation.insert(
                (Language::English, target),
                format!("Helsinki-NLP/opus-mt-en-{}", target.code()),
            );
            translation.insert(
                (target, Language::English),
                format!("Helsinki-NLP/opus-mt-{}-en", target.code()),
            );
        }
        Self {
            translation,
            transcription: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            ocr: DEFAULT_OCR_MODEL.to_string(),
            sentiment: DEFAULT_SENTIMENT_MODEL.to_string(),
        }
    }
}

impl ModelRoutes {
    /// `None` means the pair is not supported.
    pub fn translation_model(&self, source: Language, target: Language) -> Option<&str> {
        self.translation.get(&(source, target)).map(String::as_str)
    }

    pub fn translation_pairs(&self) -> impl Iterator<Item = (Language, Language, &str)> {
        self.translation
            .iter()
            .map(|((source, target), model)| (*source, *target, model.as_str()))
    }

    pub fn transcription_model(&self) -> &str {
        &self.transcription
    }

    pub fn ocr_model(&self) -> &str {
        &self.ocr
    }

    pub fn sentiment_model(&self) -> &str {
        &self.sentiment
    }

    pub fn set_transcription_model(&mut self, model: &str) {
        if let Some(model) = non_empty(model) {
            self.transcription = model;
        }
    }

    pub fn set_ocr_model(&mut self, model: &str) {
        if let Some(model) = non_empty(model) {
            self.ocr = model;
        }
    }

    pub fn set_sentiment_model(&mut self, model: &str) {
        if let Some(model) = non_empty(model) {
            self.sentiment = model;
        }
    }

    /// Merges `Source>Target=model` entries separated by `;` over the table.
    /// Nothing is applied when any entry is invalid.
    pub fn apply_translation_overrides(&mut self, raw: &str) -> Result<usize, RouteParseError> {
        let entries = parse_translation_routes(raw)?;
        let applied = entries.len();
        for (source, target, model) in entries {
            self.translation.insert((source, target), model);
        }
        Ok(applied)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn parse_translation_routes(
    raw: &str,
) -> Result<Vec<(Language, Language, String)>, RouteParseError> {
    let mut out = Vec::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (pair, model) = entry
            .split_once('=')
            .ok_or_else(|| RouteParseError::Malformed(entry.to_string()))?;
        let (source, target) = pair
            .split_once('>')
            .ok_or_else(|| RouteParseError::Malformed(entry.to_string()))?;
        let model = non_empty(model).ok_or_else(|| RouteParseError::Malformed(entry.to_string()))?;
        let source = parse_route_language(entry, source)?;
        let target = parse_route_language(entry, target)?;
        if source == target {
            return Err(RouteParseError::SamePair(entry.to_string()));
        }
        out.push((source, target, model));
    }
    Ok(out)
}

fn parse_route_language(entry: &str, raw: &str) -> Result<Language, RouteParseError> {
    Language::parse(raw).ok_or_else(|| RouteParseError::UnknownLanguage {
        entry: entry.to_string(),
        language: raw.trim().to_string(),
    })
}
