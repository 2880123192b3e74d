mod analysis;
mod credential;
pub mod dispatch;
pub mod process_env;
pub mod runtime_config;

pub use analysis::{AnalysisError, AnalysisOutput, Analyzer};
pub use credential::{process_credential, Credential};
pub use dispatch::{
    Backoff, DispatchConfig, DispatchError, Dispatcher, FailureKind, InferenceDispatch,
    RetryPolicy,
};

pub mod portable {
    /// Env file beside the executable first, so a `RUST_LOG` it sets reaches
    /// the log filter. Then logging, then the credential, so both binaries see
    /// the same configuration.
    pub fn bootstrap_current_process() {
        let loaded = crate::process_env::load_env_from_exe_dir();
        crate::init_logging();
        if let Some(loaded) = loaded.filter(|loaded| loaded.applied > 0) {
            log::info!(
                "event=env_file_loaded count={} path={}",
                loaded.applied,
                loaded.path.display()
            );
        }
        let _ = crate::credential::process_credential();
    }
}

/// `RUST_LOG` style filter, `info` when unset.
fn log_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// `log` records are bridged into the subscriber.
fn init_logging() {
    let _ = tracing_subscriber::fmt().with_env_filter(log_filter()).try_init();
}
