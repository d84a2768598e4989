//! Error types for ucgator-core

use thiserror::Error;

use crate::config::ConfigError;
use crate::connectivity::ProbeError;
use crate::notifications::NotificationApiError;

/// Result type alias using ucgator-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ucgator-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Network status provider could not register a listener
    #[error("Network subscription failed: {0}")]
    Subscription(String),

    /// Network probe error
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Notification API error
    #[error(transparent)]
    NotificationApi(#[from] NotificationApiError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
