use std::io;

use thiserror::Error;
use ucgator_core::config::ConfigError;
use ucgator_core::connectivity::ProbeError;
use ucgator_core::notifications::NotificationApiError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ucgator_core::Error),
    #[error(transparent)]
    Api(#[from] NotificationApiError),
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Credential storage error: {0}")]
    Credentials(String),
    #[error("Access token cannot be empty")]
    EmptyToken,
    #[error(
        "No reachability URL configured. Pass --probe-url, run `ucgator config set-probe-url <URL>`, or set UCGATOR_PROBE_URL."
    )]
    ProbeUrlNotConfigured,
}
