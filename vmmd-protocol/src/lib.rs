//! # vmmd-protocol
//!
//! Wire protocol for the vmmd control plane.
//!
//! This crate provides:
//! - The JSON command envelope exchanged over the daemon socket
//! - Command classification (serialized vs concurrent execution)
//! - Encoding/decoding for the one-request-per-connection exchange
//! - Protocol error types

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{
    decode_request, decode_result, encode_error, encode_request, encode_result, READ_BUFFER_SIZE,
};
pub use error::ProtocolError;
pub use message::{Command, CommandArgs, CommandClass, ErrorEnvelope, Request};
