//! # vmmd-config
//!
//! Configuration store for the vmmd daemon.
//!
//! Each control-plane request that needs configuration gets its own [`Store`]
//! instance, loaded fresh from disk; instances are never cached or shared
//! across requests. The set of properties is closed: see [`settings`] for
//! the table of known properties, their types, and their defaults.

pub mod error;
pub mod settings;
pub mod store;

pub use error::StoreError;
pub use settings::{Setting, SettingKind};
pub use store::Store;
