//! Server error types.

use std::path::PathBuf;
use thiserror::Error;

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] vmmd_protocol::ProtocolError),

    #[error("config store error: {0}")]
    Store(#[from] vmmd_config::StoreError),

    #[error("socket path '{path}' exists and is not a socket")]
    NotASocket { path: PathBuf },

    #[error("socket path '{path}' is in use by another process")]
    SocketInUse { path: PathBuf },
}
