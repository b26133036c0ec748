//! vmmd-cli - Command-line interface for the vmmd daemon.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vmmd_client::Client;

#[derive(Parser)]
#[command(name = "vmmd-cli")]
#[command(about = "Command-line interface for the vmmd virtual machine daemon")]
#[command(version)]
struct Cli {
    /// Daemon socket path
    #[arg(short, long, env = "VMMD_SOCKET", default_value = "./data/vmmd.sock")]
    socket: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the virtual machine
    Start {
        /// Disk image to boot for this start, overriding the configured one
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Stop the virtual machine
    Stop,

    /// Delete the virtual machine and its state
    Delete,

    /// Show the virtual machine status
    Status,

    /// Show the daemon version
    Version,

    /// Print the VM web console URL
    WebconsoleUrl,

    /// Get, set, or unset configuration properties
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print configuration properties (all of them when none are named)
    Get {
        /// Property names
        properties: Vec<String>,
    },

    /// Set configuration properties
    Set {
        /// name=value pairs
        #[arg(required = true)]
        properties: Vec<String>,
    },

    /// Reset configuration properties to their defaults
    Unset {
        /// Property names
        #[arg(required = true)]
        properties: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let client = Client::new(&cli.socket);

    if let Err(e) = commands::run(&client, cli.command).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
