//! Form modes and input validation.
//!
//! Every check here runs before a model route is resolved or any payload is
//! built, so rejected input never reaches the dispatcher.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::languages::Language;
use crate::routing::ModelRoutes;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
pub const AUDIO_EXTENSIONS: [&str; 2] = ["wav", "mp3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Translation,
    ImageOcr,
    AudioToText,
    Sentiment,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::Translation,
        Mode::ImageOcr,
        Mode::AudioToText,
        Mode::Sentiment,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Mode::Translation => "translation",
            Mode::ImageOcr => "ocr",
            Mode::AudioToText => "audio",
            Mode::Sentiment => "sentiment",
        }
    }

    pub fn from_slug(raw: &str) -> Option<Mode> {
        let raw = raw.trim();
        Mode::ALL
            .into_iter()
            .find(|mode| mode.slug().eq_ignore_ascii_case(raw))
    }

    pub fn title(self) -> &'static str {
        match self {
            Mode::Translation => "Text Translation",
            Mode::ImageOcr => "Image OCR",
            Mode::AudioToText => "Audio-to-Text",
            Mode::Sentiment => "Sentiment Analysis",
        }
    }

    pub fn submit_label(self) -> &'static str {
        match self {
            Mode::Translation => "Translate",
            Mode::ImageOcr => "Extract Text",
            Mode::AudioToText => "Convert Audio to Text",
            Mode::Sentiment => "Analyze Sentiment",
        }
    }

    /// Shown when the dispatcher returns its failure marker.
    pub fn unavailable_message(self) -> &'static str {
        match self {
            Mode::Translation => "Translation service is unavailable. Please try again later.",
            Mode::ImageOcr => "Error processing the image. Please try again later.",
            Mode::AudioToText => "Error processing the audio file. Please try again later.",
            Mode::Sentiment => "Sentiment service is unavailable. Please try again later.",
        }
    }

    pub fn accepted_extensions(self) -> &'static [&'static str] {
        match self {
            Mode::ImageOcr => &IMAGE_EXTENSIONS,
            Mode::AudioToText => &AUDIO_EXTENSIONS,
            Mode::Translation | Mode::Sentiment => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please enter some text to translate.")]
    EmptyTranslationText,
    #[error("Translation for the selected language pair is not supported.")]
    UnsupportedPair,
    #[error("Please upload an image.")]
    MissingImage,
    #[error("Please upload an audio file.")]
    MissingAudio,
    #[error("Please enter some text.")]
    EmptySentimentText,
    #[error("Unsupported file type `{extension}`; expected one of {allowed}.")]
    UnsupportedUpload { extension: String, allowed: String },
    #[error("Unknown language `{0}`.")]
    UnknownLanguage(String),
}

/// A file as received from the form, before any encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn extension(&self) -> Option<String> {
        let name = self.file_name.trim();
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Browsers submit an empty part when no file was chosen.
    pub fn is_empty(&self) -> bool {
        self.file_name.trim().is_empty() && self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationInput<'a> {
    pub source: Language,
    pub target: Language,
    pub text: &'a str,
    pub model: &'a str,
}

pub fn parse_language(raw: &str) -> Result<Language, FormError> {
    Language::parse(raw).ok_or_else(|| FormError::UnknownLanguage(raw.trim().to_string()))
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Empty text wins over an unsupported pair, matching the order the form reports them.
pub fn validate_translation<'a>(
    routes: &'a ModelRoutes,
    source: Language,
    target: Language,
    text: &'a str,
) -> Result<TranslationInput<'a>, FormError> {
    if is_blank(text) {
        return Err(FormError::EmptyTranslationText);
    }
    let model = routes
        .translation_model(source, target)
        .ok_or(FormError::UnsupportedPair)?;
    Ok(TranslationInput {
        source,
        target,
        text,
        model,
    })
}

pub fn validate_sentiment_text(text: &str) -> Result<&str, FormError> {
    if is_blank(text) {
        return Err(FormError::EmptySentimentText);
    }
    Ok(text)
}

/// Only looks at the file name; the bytes are not inspected or decoded.
pub fn validate_upload(mode: Mode, upload: Option<&Upload>) -> Result<&Upload, FormError> {
    let missing = match mode {
        Mode::ImageOcr => FormError::MissingImage,
        _ => FormError::MissingAudio,
    };
    let upload = match upload {
        Some(upload) if !upload.is_empty() => upload,
        _ => return Err(missing),
    };
    if upload.bytes.is_empty() {
        return Err(missing);
    }
    let allowed = mode.accepted_extensions();
    let extension = upload.extension().unwrap_or_default();
    if !allowed.contains(&extension.as_str()) {
        return Err(FormError::UnsupportedUpload {
            extension,
            allowed: allowed.join(", "),
        });
    }
    Ok(upload)
}
