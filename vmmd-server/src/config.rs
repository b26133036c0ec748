//! Daemon configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via VMMD_CONFIG)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the control-plane unix socket.
    pub socket_path: PathBuf,
    /// Base directory for the config store and machine state.
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("./data/vmmd.sock"),
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl Config {
    /// Loads configuration from file, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("VMMD_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("VMMD_SOCKET") {
            self.socket_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("VMMD_DATA") {
            self.data_dir = PathBuf::from(dir);
        }
    }

    /// Path of the per-request config store file.
    pub fn config_store_path(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// Directory holding the machine's runtime state.
    pub fn machine_state_dir(&self) -> PathBuf {
        self.data_dir.join("machine")
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file '{0}': {1}")]
    Parse(PathBuf, String),
}
