//! Machine error types.

use thiserror::Error;

/// Errors raised while preparing or driving the hypervisor.
///
/// These never cross the control plane as Rust errors: the handler embeds
/// them in its response payloads.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("config store error: {0}")]
    Store(#[from] vmmd_config::StoreError),

    #[error("no VM image configured; set 'image-path' first")]
    NoImage,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
