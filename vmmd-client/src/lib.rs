//! # vmmd-client
//!
//! Client library for the vmmd control plane.
//!
//! Each call opens a fresh connection, sends one command envelope, reads
//! the single response, and disconnects; the daemon closes the connection
//! after writing.

pub mod client;
pub mod error;

pub use client::Client;
pub use error::ClientError;
