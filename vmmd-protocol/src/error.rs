//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors that can occur while decoding an exchange.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed before a request arrived")]
    EmptyRead,

    #[error("request filled the {limit}-byte read buffer and may be truncated")]
    Truncated { limit: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
