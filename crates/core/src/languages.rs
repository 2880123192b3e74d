use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    French,
    Spanish,
    German,
    Italian,
    Russian,
    Chinese,
    Japanese,
    Hindi,
}

/// Source dropdown order shown by the translation form.
pub const SOURCE_LANGUAGES: [Language; 9] = [
    Language::English,
    Language::French,
    Language::Spanish,
    Language::German,
    Language::Italian,
    Language::Russian,
    Language::Chinese,
    Language::Japanese,
    Language::Hindi,
];

/// Target dropdown order; English sits near the end so the default pair is English -> French.
pub const TARGET_LANGUAGES: [Language; 9] = [
    Language::French,
    Language::Spanish,
    Language::German,
    Language::Italian,
    Language::Russian,
    Language::Chinese,
    Language::Japanese,
    Language::English,
    Language::Hindi,
];

impl Language {
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::French => "French",
            Language::Spanish => "Spanish",
            Language::German => "German",
            Language::Italian => "Italian",
            Language::Russian => "Russian",
            Language::Chinese => "Chinese",
            Language::Japanese => "Japanese",
            Language::Hindi => "Hindi",
        }
    }

    /// ISO-639-1 code, as used in the opus-mt model ids.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
            Language::Spanish => "es",
            Language::German => "de",
            Language::Italian => "it",
            Language::Russian => "ru",
            Language::Chinese => "zh",
            Language::Japanese => "ja",
            Language::Hindi => "hi",
        }
    }

    /// Accepts a display name or a code, case-insensitive.
    pub fn parse(raw: &str) -> Option<Language> {
        let wanted = raw.trim();
        if wanted.is_empty() {
            return None;
        }
        SOURCE_LANGUAGES.into_iter().find(|lang| {
            lang.name().eq_ignore_ascii_case(wanted) || lang.code().eq_ignore_ascii_case(wanted)
        })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_names_and_codes() {
        assert_eq!(Language::parse("english"), Some(Language::English));
        assert_eq!(Language::parse(" Hindi "), Some(Language::Hindi));
        assert_eq!(Language::parse("ZH"), Some(Language::Chinese));
        assert_eq!(Language::parse("Klingon"), None);
        assert_eq!(Language::parse(""), None);
    }

    #[test]
    fn dropdowns_cover_every_language_once() {
        let mut source = SOURCE_LANGUAGES.to_vec();
        let mut target = TARGET_LANGUAGES.to_vec();
        source.sort();
        target.sort();
        assert_eq!(source, target);
        source.dedup();
        assert_eq!(source.len(), 9);
    }
}
