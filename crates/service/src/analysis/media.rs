use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use multilens_core::form::{validate_upload, Mode, Upload};
use multilens_core::inference::{parse_image_text, parse_transcription};
use serde_json::Value;

use super::{shape_error, AnalysisError, AnalysisOutput, Analyzer};
use crate::dispatch::InferenceDispatch;

/// Files travel as base64 strings in `inputs`; nothing is decoded locally.
fn encode_upload(upload: &Upload) -> Value {
    Value::String(STANDARD.encode(&upload.bytes))
}

impl<D: InferenceDispatch> Analyzer<D> {
    pub fn extract_image_text(
        &self,
        upload: Option<&Upload>,
    ) -> Result<AnalysisOutput, AnalysisError> {
        let upload = validate_upload(Mode::ImageOcr, upload)?;
        let model = self.routes().ocr_model().to_string();
        log::debug!(
            "event=upload_accepted mode=ocr file={} bytes={}",
            upload.file_name,
            upload.bytes.len()
        );
        let value = self.call_model(Mode::ImageOcr, &model, encode_upload(upload))?;
        let text = parse_image_text(&value).map_err(shape_error(Mode::ImageOcr))?;
        Ok(AnalysisOutput {
            mode: Mode::ImageOcr,
            model,
            headline: "Extracted Text".to_string(),
            text,
        })
    }

    pub fn transcribe_audio(
        &self,
        upload: Option<&Upload>,
    ) -> Result<AnalysisOutput, AnalysisError> {
        let upload = validate_upload(Mode::AudioToText, upload)?;
        let model = self.routes().transcription_model().to_string();
        log::debug!(
            "event=upload_accepted mode=audio file={} bytes={}",
            upload.file_name,
            upload.bytes.len()
        );
        let value = self.call_model(Mode::AudioToText, &model, encode_upload(upload))?;
        let text = parse_transcription(&value).map_err(shape_error(Mode::AudioToText))?;
        Ok(AnalysisOutput {
            mode: Mode::AudioToText,
            model,
            headline: "Recognized Text".to_string(),
            text,
        })
    }
}
