//! Command execution and output formatting.

use crate::{Commands, ConfigCommands};
use serde_json::Value;
use vmmd_client::Client;
use vmmd_protocol::CommandArgs;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub async fn run(client: &Client, command: Commands) -> CommandResult {
    match command {
        Commands::Start { image } => {
            let mut args = CommandArgs::new();
            if let Some(image) = image {
                args.insert("image-path".to_string(), image.display().to_string());
            }
            print_value(&client.start(args).await?);
        }
        Commands::Stop => print_value(&client.stop().await?),
        Commands::Delete => print_value(&client.delete().await?),
        Commands::Status => print_value(&client.status().await?),
        Commands::Version => print_value(&client.version().await?),
        Commands::WebconsoleUrl => {
            let value = client.webconsole_url().await?;
            match value.get("Url").and_then(Value::as_str) {
                Some(url) => println!("{}", url),
                None => print_value(&value),
            }
        }
        Commands::Config(config) => run_config(client, config).await?,
    }
    Ok(())
}

async fn run_config(client: &Client, command: ConfigCommands) -> CommandResult {
    match command {
        ConfigCommands::Get { properties } => {
            let args = properties
                .into_iter()
                .map(|name| (name, String::new()))
                .collect();
            print_value(&client.get_config(args).await?);
        }
        ConfigCommands::Set { properties } => {
            let mut args = CommandArgs::new();
            for property in &properties {
                let (name, value) = property
                    .split_once('=')
                    .ok_or_else(|| format!("expected name=value, got '{}'", property))?;
                args.insert(name.to_string(), value.to_string());
            }
            print_value(&client.set_config(args).await?);
        }
        ConfigCommands::Unset { properties } => {
            let args = properties
                .into_iter()
                .map(|name| (name, String::new()))
                .collect();
            print_value(&client.unset_config(args).await?);
        }
    }
    Ok(())
}

fn print_value(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => println!("{}", pretty),
        Err(_) => println!("{}", value),
    }
}
