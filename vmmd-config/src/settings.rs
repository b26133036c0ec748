//! The closed table of configuration properties.

use crate::error::StoreError;

/// Value type of a configuration property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    /// Unsigned integer, must be nonzero.
    UInt,
    /// "true" or "false".
    Bool,
    /// Filesystem path or executable name.
    Path,
}

/// A known configuration property.
#[derive(Debug, Clone, Copy)]
pub struct Setting {
    /// Property name as used on the wire and in the store file.
    pub name: &'static str,
    pub kind: SettingKind,
    /// Effective value when the property is not set.
    pub default: &'static str,
}

/// Every property the daemon understands. Set/unset/get reject names
/// outside this table.
pub const SETTINGS: &[Setting] = &[
    Setting {
        name: "cpus",
        kind: SettingKind::UInt,
        default: "4",
    },
    Setting {
        name: "memory-mib",
        kind: SettingKind::UInt,
        default: "8192",
    },
    Setting {
        name: "hypervisor",
        kind: SettingKind::Path,
        default: "qemu-system-x86_64",
    },
    Setting {
        name: "image-path",
        kind: SettingKind::Path,
        default: "",
    },
    Setting {
        name: "webconsole-port",
        kind: SettingKind::UInt,
        default: "8443",
    },
    Setting {
        name: "headless",
        kind: SettingKind::Bool,
        default: "true",
    },
];

/// Looks up a property by name.
pub fn lookup(name: &str) -> Option<&'static Setting> {
    SETTINGS.iter().find(|s| s.name == name)
}

impl Setting {
    /// Validates a candidate value against this property's type.
    pub fn validate(&self, value: &str) -> Result<(), StoreError> {
        let reason = match self.kind {
            SettingKind::UInt => match value.parse::<u64>() {
                Ok(0) => Some("must be greater than zero".to_string()),
                Ok(_) => None,
                Err(_) => Some("expected an unsigned integer".to_string()),
            },
            SettingKind::Bool => match value {
                "true" | "false" => None,
                _ => Some("expected 'true' or 'false'".to_string()),
            },
            SettingKind::Path => {
                if value.is_empty() {
                    Some("expected a non-empty path".to_string())
                } else {
                    None
                }
            }
        };

        match reason {
            Some(reason) => Err(StoreError::InvalidValue {
                name: self.name.to_string(),
                value: value.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}
