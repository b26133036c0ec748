//! File-backed property store.

use crate::error::StoreError;
use crate::settings::{self, SETTINGS};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// A configuration store bound to a JSON file on disk.
///
/// Only explicitly-set values are persisted; defaults come from the
/// settings table at read time. Writes go through a temp file and rename so
/// a crash never leaves a half-written store.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl Store {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }

    /// Returns the effective value of a property: the stored value if set,
    /// the table default otherwise.
    pub fn get(&self, name: &str) -> Result<String, StoreError> {
        let setting = settings::lookup(name)
            .ok_or_else(|| StoreError::UnknownProperty(name.to_string()))?;
        Ok(self
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| setting.default.to_string()))
    }

    /// Returns whether a property has an explicitly stored value.
    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Validates and stores a property value, then persists the store.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), StoreError> {
        let setting = settings::lookup(name)
            .ok_or_else(|| StoreError::UnknownProperty(name.to_string()))?;
        setting.validate(value)?;
        self.values.insert(name.to_string(), value.to_string());
        self.persist()
    }

    /// Removes a stored value, restoring the default, then persists.
    pub fn unset(&mut self, name: &str) -> Result<(), StoreError> {
        if settings::lookup(name).is_none() {
            return Err(StoreError::UnknownProperty(name.to_string()));
        }
        self.values.remove(name);
        self.persist()
    }

    /// Effective values for every known property, in table order.
    pub fn all(&self) -> BTreeMap<&'static str, String> {
        SETTINGS
            .iter()
            .map(|s| {
                let value = self
                    .values
                    .get(s.name)
                    .cloned()
                    .unwrap_or_else(|| s.default.to_string());
                (s.name, value)
            })
            .collect()
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.values)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
