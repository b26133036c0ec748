//! Client error types.

use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] vmmd_protocol::ProtocolError),

    #[error("daemon closed the connection without a response")]
    Abandoned,

    #[error("daemon error: {0}")]
    Daemon(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
