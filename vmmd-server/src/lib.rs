//! # vmmd-server
//!
//! The vmmd control plane: a unix-socket listener accepting one JSON
//! command envelope per connection.
//!
//! State-mutating commands (`start`, `stop`, `delete`) are serialized
//! through a single worker draining a bounded queue; read-only and
//! config-scoped commands execute concurrently. A full queue rejects new
//! mutating requests immediately rather than letting a backlog grow.

pub mod config;
mod dispatch;
pub mod error;
pub mod handler;
pub mod server;

pub use config::Config;
pub use error::ServerError;
pub use handler::{CommandHandler, ConfigFactory, FileConfigFactory};
pub use server::{Server, ServerStats, OPS_QUEUE_CAPACITY};
