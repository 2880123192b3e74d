use multilens_core::form::{validate_translation, FormError};
use multilens_core::languages::{SOURCE_LANGUAGES, TARGET_LANGUAGES};
use multilens_core::{Language, ModelRoutes};

#[test]
fn every_dropdown_pair_either_resolves_or_is_rejected() {
    let routes = ModelRoutes::default();
    let mut supported = 0;
    for source in SOURCE_LANGUAGES {
        for target in TARGET_LANGUAGES {
            match validate_translation(&routes, source, target, "text") {
                Ok(input) => {
                    supported += 1;
                    assert!(input.model.starts_with("Helsinki-NLP/opus-mt-"));
                    assert!(source == Language::English || target == Language::English);
                }
                Err(err) => assert_eq!(err, FormError::UnsupportedPair),
            }
        }
    }
    assert_eq!(supported, 16);
}

#[test]
fn model_ids_follow_language_codes() {
    let routes = ModelRoutes::default();
    for (source, target, model) in routes.translation_pairs() {
        assert_eq!(
            model,
            format!("Helsinki-NLP/opus-mt-{}-{}", source.code(), target.code())
        );
    }
}

#[test]
fn override_enables_a_direct_pair() {
    let mut routes = ModelRoutes::default();
    assert_eq!(
        validate_translation(&routes, Language::French, Language::Spanish, "salut"),
        Err(FormError::UnsupportedPair)
    );
    routes
        .apply_translation_overrides("fr>es=Helsinki-NLP/opus-mt-fr-es")
        .expect("override");
    let input = validate_translation(&routes, Language::French, Language::Spanish, "salut")
        .expect("now supported");
    assert_eq!(input.model, "Helsinki-NLP/opus-mt-fr-es");
}
