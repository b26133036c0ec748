//! Config store error types.

use thiserror::Error;

/// Errors from the configuration store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config store: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown configuration property: {0}")]
    UnknownProperty(String),

    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}
