use multilens_core::form::{parse_language, validate_translation, Mode};
use multilens_core::inference::parse_translation;
use multilens_core::languages::Language;
use serde_json::Value;

use super::{shape_error, AnalysisError, AnalysisOutput, Analyzer};
use crate::dispatch::InferenceDispatch;

impl<D: InferenceDispatch> Analyzer<D> {
    pub fn translate(
        &self,
        source: Language,
        target: Language,
        text: &str,
    ) -> Result<AnalysisOutput, AnalysisError> {
        let input = validate_translation(self.routes(), source, target, text)?;
        let model = input.model.to_string();
        let value = self.call_model(
            Mode::Translation,
            &model,
            Value::String(input.text.to_string()),
        )?;
        let translated = parse_translation(&value).map_err(shape_error(Mode::Translation))?;
        Ok(AnalysisOutput {
            mode: Mode::Translation,
            model,
            headline: format!("Translated Text ({target})"),
            text: translated,
        })
    }

    /// Form entry point: language names arrive as the dropdown strings.
    pub fn translate_named(
        &self,
        source: &str,
        target: &str,
        text: &str,
    ) -> Result<AnalysisOutput, AnalysisError> {
        let source = parse_language(source)?;
        let target = parse_language(target)?;
        self.translate(source, target, text)
    }
}
