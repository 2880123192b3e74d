use multilens_core::routing::ModelRoutes;
use std::time::Duration;

use crate::dispatch::retry_policy::{
    parse_retry_on, Backoff, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY,
};
use crate::dispatch::{DispatchConfig, DEFAULT_INFERENCE_BASE_URL};
use crate::process_env::env_non_empty;

const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

pub const ENV_INFERENCE_BASE_URL: &str = "MULTILENS_INFERENCE_BASE_URL";
pub const ENV_RETRY_MAX_ATTEMPTS: &str = "MULTILENS_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_DELAY_MS: &str = "MULTILENS_RETRY_DELAY_MS";
pub const ENV_RETRY_BACKOFF: &str = "MULTILENS_RETRY_BACKOFF";
pub const ENV_RETRY_MAX_DELAY_MS: &str = "MULTILENS_RETRY_MAX_DELAY_MS";
pub const ENV_RETRY_ON: &str = "MULTILENS_RETRY_ON";
pub const ENV_DISPATCH_TOTAL_TIMEOUT_MS: &str = "MULTILENS_DISPATCH_TOTAL_TIMEOUT_MS";
pub const ENV_HTTP_CONNECT_TIMEOUT_SECS: &str = "MULTILENS_HTTP_CONNECT_TIMEOUT_SECS";
pub const ENV_TRANSLATION_MODELS: &str = "MULTILENS_TRANSLATION_MODELS";
pub const ENV_ASR_MODEL: &str = "MULTILENS_ASR_MODEL";
pub const ENV_OCR_MODEL: &str = "MULTILENS_OCR_MODEL";
pub const ENV_SENTIMENT_MODEL: &str = "MULTILENS_SENTIMENT_MODEL";

fn env_u64(name: &str) -> Option<u64> {
    let raw = env_non_empty(name)?;
    match raw.parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("event=config_invalid env={} value={} action=default", name, raw);
            None
        }
    }
}

fn env_u64_or(name: &str, default: u64) -> u64 {
    env_u64(name).unwrap_or(default)
}

/// Zero and unset both mean "no limit".
fn env_optional_duration(name: &str, unit: fn(u64) -> Duration) -> Option<Duration> {
    env_u64(name).filter(|value| *value > 0).map(unit)
}

pub(crate) fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }
    Some(trimmed.to_string())
}

fn resolve_base_url() -> String {
    let Some(raw) = env_non_empty(ENV_INFERENCE_BASE_URL) else {
        return DEFAULT_INFERENCE_BASE_URL.to_string();
    };
    normalize_base_url(&raw).unwrap_or_else(|| {
        log::warn!(
            "event=config_invalid env={} value={} action=default",
            ENV_INFERENCE_BASE_URL,
            raw
        );
        DEFAULT_INFERENCE_BASE_URL.to_string()
    })
}

fn resolve_retry_policy() -> RetryPolicy {
    let max_attempts = env_u64_or(ENV_RETRY_MAX_ATTEMPTS, u64::from(DEFAULT_MAX_ATTEMPTS))
        .min(u64::from(u32::MAX)) as u32;
    let delay_ms = env_u64_or(ENV_RETRY_DELAY_MS, DEFAULT_RETRY_DELAY.as_millis() as u64);
    let backoff = match env_non_empty(ENV_RETRY_BACKOFF).as_deref() {
        Some(mode) if mode.eq_ignore_ascii_case("exponential") => Backoff::ExponentialJitter {
            base: Duration::from_millis(delay_ms),
            cap: Duration::from_millis(env_u64_or(
                ENV_RETRY_MAX_DELAY_MS,
                DEFAULT_RETRY_MAX_DELAY_MS,
            )),
        },
        Some(mode) if !mode.eq_ignore_ascii_case("fixed") => {
            log::warn!(
                "event=config_invalid env={} value={} action=fixed",
                ENV_RETRY_BACKOFF,
                mode
            );
            Backoff::Fixed(Duration::from_millis(delay_ms))
        }
        _ => Backoff::Fixed(Duration::from_millis(delay_ms)),
    };
    let policy = RetryPolicy::new(max_attempts, backoff);
    let Some(raw) = env_non_empty(ENV_RETRY_ON) else {
        return policy;
    };
    match parse_retry_on(&raw) {
        Ok(kinds) => policy.with_retry_on(kinds),
        Err(err) => {
            log::warn!(
                "event=config_invalid env={} err={} action=retry_all",
                ENV_RETRY_ON,
                err
            );
            policy
        }
    }
}

pub fn dispatch_config_from_env() -> DispatchConfig {
    DispatchConfig {
        base_url: resolve_base_url(),
        policy: resolve_retry_policy(),
        total_timeout: env_optional_duration(ENV_DISPATCH_TOTAL_TIMEOUT_MS, Duration::from_millis),
        connect_timeout: env_optional_duration(ENV_HTTP_CONNECT_TIMEOUT_SECS, Duration::from_secs),
    }
}

/// Defaults merged with any route overrides from the environment.
pub fn model_routes_from_env() -> ModelRoutes {
    let mut routes = ModelRoutes::default();
    if let Some(raw) = env_non_empty(ENV_TRANSLATION_MODELS) {
        match routes.apply_translation_overrides(&raw) {
            Ok(applied) => log::info!("event=translation_routes_loaded count={}", applied),
            Err(err) => log::warn!(
                "event=config_invalid env={} err={} action=defaults",
                ENV_TRANSLATION_MODELS,
                err
            ),
        }
    }
    if let Some(model) = env_non_empty(ENV_ASR_MODEL) {
        routes.set_transcription_model(&model);
    }
    if let Some(model) = env_non_empty(ENV_OCR_MODEL) {
        routes.set_ocr_model(&model);
    }
    if let Some(model) = env_non_empty(ENV_SENTIMENT_MODEL) {
        routes.set_sentiment_model(&model);
    }
    routes
}
