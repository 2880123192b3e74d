//! Inference dispatcher: one retrying `POST {base}/{model}` per call.
//!
//! Every failure is caught here. Callers only see the decoded JSON body or
//! `None`, the failure marker meaning "operation unavailable now".

mod backoff;
mod deadline;
pub mod retry_policy;

use std::error::Error as _;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::credential::Credential;

pub use retry_policy::{Backoff, FailureKind, RetryPolicy};

pub const DEFAULT_INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co/models";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("endpoint id is empty")]
    EmptyEndpoint,
    #[error("payload could not be serialized: {0}")]
    Payload(String),
    #[error("{kind} failure on attempt {attempt}: {message}")]
    Attempt {
        kind: FailureKind,
        attempt: u32,
        message: String,
    },
    #[error("dispatch deadline exceeded after {attempts} attempt(s)")]
    DeadlineExceeded { attempts: u32 },
}

impl DispatchError {
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            DispatchError::Attempt { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Seam between the analysis operations and the network.
pub trait InferenceDispatch {
    fn dispatch(&self, endpoint: &str, payload: Value) -> Option<Value>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub base_url: String,
    pub policy: RetryPolicy,
    /// Budget across all attempts and waits; `None` keeps only the client's own timeouts.
    pub total_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INFERENCE_BASE_URL.to_string(),
            policy: RetryPolicy::default(),
            total_timeout: None,
            connect_timeout: None,
        }
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    client: Client,
    base_url: String,
    credential: Option<Credential>,
    policy: RetryPolicy,
    total_timeout: Option<Duration>,
}

fn build_client(connect_timeout: Option<Duration>) -> Client {
    let mut builder = Client::builder();
    if let Some(timeout) = connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    builder.build().unwrap_or_else(|err| {
        log::warn!("event=inference_client_build_failed err={} action=default_client", err);
        Client::new()
    })
}

fn error_chain_mentions_tls(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = err.source();
    while let Some(current) = source {
        let text = current.to_string().to_ascii_lowercase();
        if text.contains("tls")
            || text.contains("ssl")
            || text.contains("certificate")
            || text.contains("handshake")
        {
            return true;
        }
        source = current.source();
    }
    false
}

pub(crate) fn classify_failure(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        return FailureKind::Timeout;
    }
    if error_chain_mentions_tls(err) {
        return FailureKind::Tls;
    }
    if err.is_connect() {
        return FailureKind::Connect;
    }
    if err.is_status() {
        return FailureKind::Status;
    }
    if err.is_decode() {
        return FailureKind::Decode;
    }
    FailureKind::Other
}

impl Dispatcher {
    pub fn new(config: DispatchConfig, credential: Option<Credential>) -> Self {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        Self {
            client: build_client(config.connect_timeout),
            base_url,
            credential,
            policy: config.policy,
            total_timeout: config.total_timeout,
        }
    }

    /// Configuration from the environment plus the process-wide credential.
    pub fn from_env() -> Self {
        Self::new(
            crate::runtime_config::dispatch_config_from_env(),
            crate::credential::process_credential(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn endpoint_url(&self, endpoint: &str) -> Result<String, DispatchError> {
        let endpoint = endpoint.trim().trim_matches('/');
        if endpoint.is_empty() {
            return Err(DispatchError::EmptyEndpoint);
        }
        Ok(format!("{}/{}", self.base_url, endpoint))
    }

    /// Returns the decoded body, or `None` once the retry policy gives up.
    pub fn dispatch<P>(&self, endpoint: &str, payload: &P) -> Option<Value>
    where
        P: Serialize + ?Sized,
    {
        match self.try_dispatch(endpoint, payload) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!(
                    "event=inference_dispatch_exhausted endpoint={} err={}",
                    endpoint,
                    err
                );
                None
            }
        }
    }

    /// Same loop as [`Dispatcher::dispatch`] but keeps the last failure.
    pub fn try_dispatch<P>(&self, endpoint: &str, payload: &P) -> Result<Value, DispatchError>
    where
        P: Serialize + ?Sized,
    {
        let url = self.endpoint_url(endpoint)?;
        let inputs =
            serde_json::to_value(payload).map_err(|err| DispatchError::Payload(err.to_string()))?;
        let body = serde_json::json!({ "inputs": inputs });
        let deadline = deadline::deadline_from(Instant::now(), self.total_timeout);
        let max_attempts = self.policy.max_attempts();

        let mut attempt = 0_u32;
        loop {
            attempt += 1;
            let err = match self.send_once(&url, &body, deadline) {
                Ok(value) => {
                    if attempt > 1 {
                        log::info!(
                            "event=inference_dispatch_recovered endpoint={} attempt={}",
                            endpoint,
                            attempt
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };
            let kind = classify_failure(&err);
            log::warn!(
                "event=inference_dispatch_failed endpoint={} attempt={}/{} kind={} err={}",
                endpoint,
                attempt,
                max_attempts,
                kind,
                err
            );
            let failure = DispatchError::Attempt {
                kind,
                attempt,
                message: err.to_string(),
            };
            if attempt >= max_attempts || !self.policy.should_retry(kind) {
                return Err(failure);
            }
            if !backoff::sleep_before_retry(self.policy.delay_after(attempt), deadline) {
                return Err(DispatchError::DeadlineExceeded { attempts: attempt });
            }
        }
    }

    fn send_once(
        &self,
        url: &str,
        body: &Value,
        deadline: Option<Instant>,
    ) -> Result<Value, reqwest::Error> {
        let mut builder = self.client.post(url).json(body);
        if let Some(credential) = &self.credential {
            builder = builder.header(reqwest::header::AUTHORIZATION, credential.bearer_value());
        }
        if let Some(timeout) = deadline::send_timeout(deadline) {
            builder = builder.timeout(timeout);
        }
        builder.send()?.error_for_status()?.json::<Value>()
    }
}

impl InferenceDispatch for Dispatcher {
    fn dispatch(&self, endpoint: &str, payload: Value) -> Option<Value> {
        Dispatcher::dispatch(self, endpoint, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(base_url: &str) -> Dispatcher {
        Dispatcher::new(
            DispatchConfig {
                base_url: base_url.to_string(),
                ..DispatchConfig::default()
            },
            None,
        )
    }

    #[test]
    fn endpoint_url_joins_model_path() {
        let d = dispatcher("https://api-inference.huggingface.co/models/");
        assert_eq!(
            d.endpoint_url("Helsinki-NLP/opus-mt-en-fr").expect("url"),
            "https://api-inference.huggingface.co/models/Helsinki-NLP/opus-mt-en-fr"
        );
        assert_eq!(
            d.endpoint_url("/openai/whisper-large-v2/").expect("url"),
            "https://api-inference.huggingface.co/models/openai/whisper-large-v2"
        );
    }

    #[test]
    fn empty_endpoint_fails_without_network() {
        let d = dispatcher("http://127.0.0.1:9");
        assert!(matches!(
            d.try_dispatch("  ", "hello"),
            Err(DispatchError::EmptyEndpoint)
        ));
        assert_eq!(d.dispatch("", "hello"), None);
    }
}
