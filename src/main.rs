//! vmmd - Single-host virtual machine manager daemon
//!
//! Exposes the VM control plane on a unix domain socket; see vmmd-cli for
//! the matching client.

use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vmmd_machine::Machine;
use vmmd_server::{Config, FileConfigFactory, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration (from file if VMMD_CONFIG is set, then env overrides)
    let config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("VMMD_CONFIG") {
                tracing::info!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!("Starting vmmd");
    tracing::info!("  Socket path: {}", config.socket_path.display());
    tracing::info!("  Data directory: {}", config.data_dir.display());

    std::fs::create_dir_all(&config.data_dir)?;

    let machine = Arc::new(Machine::new("vmmd", config.machine_state_dir()));
    let factory = Arc::new(FileConfigFactory::new(config.config_store_path()));
    let server = Arc::new(Server::new(&config.socket_path, machine, factory));

    // Spawn shutdown signal handler
    let shutdown_server = server.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Received shutdown signal, stopping server...");
        shutdown_server.shutdown();
    });

    // Run server (blocks until shutdown)
    server.run().await?;

    tracing::info!("Server stopped");
    Ok(())
}
