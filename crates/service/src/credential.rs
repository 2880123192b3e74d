use std::fmt;
use std::sync::OnceLock;

use crate::process_env;

static PROCESS_CREDENTIAL: OnceLock<Option<Credential>> = OnceLock::new();

/// Bearer token for the inference host. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl AsRef<str>) -> Option<Self> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            return None;
        }
        Some(Self(token.to_string()))
    }

    pub fn bearer_value(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Resolved once from `MULTILENS_HF_TOKEN` or the token file, then fixed for the process.
pub fn process_credential() -> Option<Credential> {
    PROCESS_CREDENTIAL
        .get_or_init(|| {
            let credential =
                process_env::read_hf_token_from_env_or_file().and_then(Credential::new);
            if credential.is_none() {
                log::warn!(
                    "event=inference_credential_missing env={} file={}",
                    process_env::ENV_HF_TOKEN,
                    process_env::hf_token_file_path().display()
                );
            }
            credential
        })
        .clone()
}
