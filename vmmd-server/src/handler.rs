//! Handler and config-factory seams.

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use vmmd_config::{Store, StoreError};
use vmmd_protocol::CommandArgs;

/// The VM lifecycle operations behind the control plane.
///
/// Serialized-class methods (`start`, `stop`, `delete`) are only ever
/// invoked one at a time, in queue order, by the operations worker; the
/// implementation does not need its own locking for them.
/// Concurrent-class methods must tolerate overlapping invocations.
///
/// Handler-domain failures (VM already running, no image configured, ...)
/// are embedded in the returned payload as `{"Error": ...}`; the dispatch
/// engine writes whatever the handler returns, verbatim.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    async fn start(&self, config: Store, args: &CommandArgs) -> Value;
    async fn stop(&self) -> Value;
    async fn delete(&self) -> Value;
    async fn status(&self) -> Value;
    async fn get_version(&self) -> Value;
    async fn set_config(&self, config: Store, args: &CommandArgs) -> Value;
    async fn unset_config(&self, config: Store, args: &CommandArgs) -> Value;
    async fn get_config(&self, config: Store, args: &CommandArgs) -> Value;
    async fn get_webconsole_info(&self) -> Value;
}

/// Builds a fresh configuration store for a single request.
///
/// Called once per config-taking command, independently each time; stores
/// are never cached or shared across requests.
pub trait ConfigFactory: Send + Sync + 'static {
    fn new_store(&self) -> Result<Store, StoreError>;
}

/// Factory that loads the store from a fixed path on every request.
pub struct FileConfigFactory {
    path: PathBuf,
}

impl FileConfigFactory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigFactory for FileConfigFactory {
    fn new_store(&self) -> Result<Store, StoreError> {
        Store::open(&self.path)
    }
}
