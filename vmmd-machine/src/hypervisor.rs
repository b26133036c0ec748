//! Hypervisor command-line construction.

use crate::error::MachineError;
use vmmd_config::Store;
use vmmd_protocol::CommandArgs;

/// A fully-resolved hypervisor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub binary: String,
    pub args: Vec<String>,
    pub webconsole_port: u16,
}

/// Resolves the hypervisor invocation from the config store.
///
/// Request args may override `image-path` for a one-off start; everything
/// else comes from the store.
pub fn launch_spec(store: &Store, overrides: &CommandArgs) -> Result<LaunchSpec, MachineError> {
    let binary = store.get("hypervisor")?;
    let cpus = store.get("cpus")?;
    let memory = store.get("memory-mib")?;
    let headless = store.get("headless")? == "true";
    let image = match overrides.get("image-path") {
        Some(image) => image.clone(),
        None => store.get("image-path")?,
    };
    if image.is_empty() {
        return Err(MachineError::NoImage);
    }
    // The port is validated as a UInt by the store; out-of-range values
    // fall back to the table default.
    let webconsole_port = store
        .get("webconsole-port")?
        .parse::<u16>()
        .unwrap_or(8443);

    let mut args = vec![
        "-smp".to_string(),
        cpus,
        "-m".to_string(),
        memory,
        "-drive".to_string(),
        format!("file={},if=virtio", image),
    ];
    if headless {
        args.push("-display".to_string());
        args.push("none".to_string());
    }

    Ok(LaunchSpec {
        binary,
        args,
        webconsole_port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> Store {
        Store::open(dir.path().join("config.json")).unwrap()
    }

    #[test]
    fn test_spec_from_defaults_and_image() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.set("image-path", "/var/lib/vmmd/vm.qcow2").unwrap();

        let spec = launch_spec(&store, &CommandArgs::new()).unwrap();
        assert_eq!(spec.binary, "qemu-system-x86_64");
        assert_eq!(spec.webconsole_port, 8443);
        assert_eq!(
            spec.args,
            vec![
                "-smp",
                "4",
                "-m",
                "8192",
                "-drive",
                "file=/var/lib/vmmd/vm.qcow2,if=virtio",
                "-display",
                "none",
            ]
        );
    }

    #[test]
    fn test_spec_requires_an_image() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(matches!(
            launch_spec(&store, &CommandArgs::new()),
            Err(MachineError::NoImage)
        ));
    }

    #[test]
    fn test_request_args_override_image() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.set("image-path", "/images/stored.qcow2").unwrap();

        let mut overrides = CommandArgs::new();
        overrides.insert("image-path".to_string(), "/images/oneoff.qcow2".to_string());

        let spec = launch_spec(&store, &overrides).unwrap();
        assert!(spec.args.iter().any(|a| a.contains("oneoff.qcow2")));
    }

    #[test]
    fn test_windowed_machine_keeps_display() {
        let dir = TempDir::new().unwrap();
        let mut store = store(&dir);
        store.set("image-path", "/images/vm.qcow2").unwrap();
        store.set("headless", "false").unwrap();

        let spec = launch_spec(&store, &CommandArgs::new()).unwrap();
        assert!(!spec.args.contains(&"-display".to_string()));
    }
}
