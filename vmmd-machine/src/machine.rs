//! The machine handler: one VM, one hypervisor child process.

use crate::hypervisor;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Child;
use tokio::sync::Mutex;
use vmmd_config::Store;
use vmmd_protocol::CommandArgs;
use vmmd_server::CommandHandler;

/// Supervises a single virtual machine.
///
/// Serialized commands (`start`, `stop`, `delete`) arrive one at a time by
/// contract of the control plane; the mutex exists because the read-only
/// commands (`status`, `webconsoleurl`) may poll the same state while a
/// mutation is in flight.
pub struct Machine {
    name: String,
    state_dir: PathBuf,
    state: Mutex<VmState>,
}

#[derive(Default)]
struct VmState {
    child: Option<Child>,
    webconsole_port: Option<u16>,
}

impl VmState {
    /// Reaps an exited child, returning whether the VM is still running.
    fn poll_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    tracing::info!("Hypervisor exited: {}", status);
                    self.child = None;
                    false
                }
                Err(e) => {
                    tracing::error!("Failed to poll hypervisor: {}", e);
                    self.child = None;
                    false
                }
            },
            None => false,
        }
    }
}

impl Machine {
    pub fn new(name: impl Into<String>, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            state_dir: state_dir.into(),
            state: Mutex::new(VmState::default()),
        }
    }

    fn pid_file(&self) -> PathBuf {
        self.state_dir.join("hypervisor.pid")
    }

    fn error(&self, message: impl Into<String>) -> Value {
        json!({"Name": self.name, "Error": message.into()})
    }
}

#[async_trait]
impl CommandHandler for Machine {
    async fn start(&self, config: Store, args: &CommandArgs) -> Value {
        let mut state = self.state.lock().await;
        if state.poll_running() {
            return self.error("virtual machine is already running");
        }

        let spec = match hypervisor::launch_spec(&config, args) {
            Ok(spec) => spec,
            Err(e) => return self.error(e.to_string()),
        };

        if let Err(e) = std::fs::create_dir_all(&self.state_dir) {
            return self.error(format!("failed to create state directory: {}", e));
        }

        tracing::info!("Launching hypervisor: {} {:?}", spec.binary, spec.args);
        let child = match tokio::process::Command::new(&spec.binary)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return self.error(format!("failed to launch hypervisor: {}", e)),
        };

        if let Some(pid) = child.id() {
            if let Err(e) = std::fs::write(self.pid_file(), pid.to_string()) {
                tracing::warn!("Failed to write pid file: {}", e);
            }
        }
        state.webconsole_port = Some(spec.webconsole_port);
        state.child = Some(child);

        json!({"Name": self.name, "Status": "Running"})
    }

    async fn stop(&self) -> Value {
        let mut state = self.state.lock().await;
        if !state.poll_running() {
            return json!({
                "Name": self.name,
                "Success": false,
                "Error": "virtual machine is not running",
            });
        }

        // poll_running just confirmed the child is present.
        if let Some(mut child) = state.child.take() {
            if let Err(e) = child.start_kill() {
                state.child = Some(child);
                return self.error(format!("failed to stop hypervisor: {}", e));
            }
            if let Err(e) = child.wait().await {
                tracing::warn!("Failed to reap hypervisor: {}", e);
            }
        }
        state.webconsole_port = None;
        if let Err(e) = std::fs::remove_file(self.pid_file()) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove pid file: {}", e);
            }
        }

        json!({"Name": self.name, "Success": true})
    }

    async fn delete(&self) -> Value {
        let mut state = self.state.lock().await;
        if let Some(mut child) = state.child.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        state.webconsole_port = None;

        if let Err(e) = std::fs::remove_dir_all(&self.state_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return self.error(format!("failed to remove state directory: {}", e));
            }
        }

        json!({"Name": self.name, "Success": true})
    }

    async fn status(&self) -> Value {
        let mut state = self.state.lock().await;
        let status = if state.poll_running() {
            "Running"
        } else {
            "Stopped"
        };
        json!({"Name": self.name, "Status": status})
    }

    async fn get_version(&self) -> Value {
        json!({
            "Version": env!("CARGO_PKG_VERSION"),
            "Success": true,
        })
    }

    async fn set_config(&self, mut config: Store, args: &CommandArgs) -> Value {
        let mut keys: Vec<&String> = args.keys().collect();
        keys.sort();
        for key in &keys {
            if let Err(e) = config.set(key, &args[key.as_str()]) {
                return self.error(e.to_string());
            }
        }
        json!({"Success": true, "Properties": keys})
    }

    async fn unset_config(&self, mut config: Store, args: &CommandArgs) -> Value {
        let mut keys: Vec<&String> = args.keys().collect();
        keys.sort();
        for key in &keys {
            if let Err(e) = config.unset(key) {
                return self.error(e.to_string());
            }
        }
        json!({"Success": true, "Properties": keys})
    }

    async fn get_config(&self, config: Store, args: &CommandArgs) -> Value {
        let mut configs = Map::new();
        if args.is_empty() {
            for (name, value) in config.all() {
                configs.insert(name.to_string(), Value::String(value));
            }
        } else {
            let mut keys: Vec<&String> = args.keys().collect();
            keys.sort();
            for key in keys {
                match config.get(key) {
                    Ok(value) => {
                        configs.insert(key.clone(), Value::String(value));
                    }
                    Err(e) => return self.error(e.to_string()),
                }
            }
        }
        json!({"Configs": configs})
    }

    async fn get_webconsole_info(&self) -> Value {
        let mut state = self.state.lock().await;
        if !state.poll_running() {
            return self.error("virtual machine is not running");
        }
        let port = state.webconsole_port.unwrap_or(8443);
        json!({"Url": format!("https://127.0.0.1:{}", port)})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn machine(dir: &TempDir) -> Machine {
        Machine::new("testvm", dir.path().join("machine"))
    }

    fn store(dir: &TempDir) -> Store {
        Store::open(dir.path().join("config.json")).unwrap()
    }

    #[tokio::test]
    async fn test_status_of_fresh_machine_is_stopped() {
        let dir = TempDir::new().unwrap();
        let value = machine(&dir).status().await;
        assert_eq!(value["Status"], "Stopped");
        assert_eq!(value["Name"], "testvm");
    }

    #[tokio::test]
    async fn test_stop_without_running_vm_fails() {
        let dir = TempDir::new().unwrap();
        let value = machine(&dir).stop().await;
        assert_eq!(value["Success"], false);
        assert_eq!(value["Error"], "virtual machine is not running");
    }

    #[tokio::test]
    async fn test_webconsole_requires_running_vm() {
        let dir = TempDir::new().unwrap();
        let value = machine(&dir).get_webconsole_info().await;
        assert_eq!(value["Error"], "virtual machine is not running");
    }

    #[tokio::test]
    async fn test_start_without_image_reports_error() {
        let dir = TempDir::new().unwrap();
        let value = machine(&dir)
            .start(store(&dir), &CommandArgs::new())
            .await;
        let message = value["Error"].as_str().unwrap();
        assert!(message.contains("image-path"));
    }

    #[tokio::test]
    async fn test_start_with_missing_hypervisor_reports_error() {
        let dir = TempDir::new().unwrap();
        let mut config = store(&dir);
        config.set("hypervisor", "/nonexistent/hypervisor").unwrap();
        config.set("image-path", "/images/vm.qcow2").unwrap();

        let value = machine(&dir).start(config, &CommandArgs::new()).await;
        let message = value["Error"].as_str().unwrap();
        assert!(message.starts_with("failed to launch hypervisor:"));
    }

    #[tokio::test]
    async fn test_delete_removes_state_dir() {
        let dir = TempDir::new().unwrap();
        let m = machine(&dir);
        std::fs::create_dir_all(dir.path().join("machine")).unwrap();
        std::fs::write(dir.path().join("machine/hypervisor.pid"), "123").unwrap();

        let value = m.delete().await;
        assert_eq!(value["Success"], true);
        assert!(!dir.path().join("machine").exists());
    }

    #[tokio::test]
    async fn test_config_commands_operate_on_the_store() {
        let dir = TempDir::new().unwrap();
        let m = machine(&dir);

        let mut args = CommandArgs::new();
        args.insert("cpus".to_string(), "8".to_string());
        let value = m.set_config(store(&dir), &args).await;
        assert_eq!(value["Success"], true);

        let value = m.get_config(store(&dir), &args).await;
        assert_eq!(value["Configs"]["cpus"], "8");

        let value = m.unset_config(store(&dir), &args).await;
        assert_eq!(value["Success"], true);

        let value = m.get_config(store(&dir), &CommandArgs::new()).await;
        assert_eq!(value["Configs"]["cpus"], "4");
    }

    #[tokio::test]
    async fn test_set_config_rejects_unknown_property() {
        let dir = TempDir::new().unwrap();
        let mut args = CommandArgs::new();
        args.insert("nested-virt".to_string(), "true".to_string());

        let value = machine(&dir).set_config(store(&dir), &args).await;
        let message = value["Error"].as_str().unwrap();
        assert!(message.contains("nested-virt"));
    }
}
