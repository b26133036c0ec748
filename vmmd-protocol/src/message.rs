//! JSON envelope types and command classification.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Command arguments, passed through to the handler untouched.
pub type CommandArgs = HashMap<String, String>;

/// Request envelope. Exactly one is exchanged per connection.
///
/// `command` stays a plain string here: an unrecognized command must still
/// decode so the router can answer it with an error envelope. Parsing into
/// [`Command`] happens after decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Command name selecting the operation.
    pub command: String,

    /// Operation-specific arguments, opaque to the dispatch engine.
    #[serde(default)]
    pub args: CommandArgs,
}

impl Request {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: CommandArgs::new(),
        }
    }

    pub fn with_args(mut self, args: CommandArgs) -> Self {
        self.args = args;
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// The sole error shape on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "Error")]
    pub error: String,
}

/// The known control-plane commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Stop,
    Delete,
    Status,
    Version,
    SetConfig,
    UnsetConfig,
    GetConfig,
    WebconsoleUrl,
}

/// Execution class of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// State-mutating; drained one at a time, in arrival order, by the
    /// operations worker.
    Serialized,
    /// Read-only or config-scoped; executes immediately and may overlap
    /// with any other command.
    Concurrent,
}

impl Command {
    /// Parses a wire command name. Unknown names return `None`.
    pub fn parse(name: &str) -> Option<Command> {
        match name {
            "start" => Some(Command::Start),
            "stop" => Some(Command::Stop),
            "delete" => Some(Command::Delete),
            "status" => Some(Command::Status),
            "version" => Some(Command::Version),
            "setconfig" => Some(Command::SetConfig),
            "unsetconfig" => Some(Command::UnsetConfig),
            "getconfig" => Some(Command::GetConfig),
            "webconsoleurl" => Some(Command::WebconsoleUrl),
            _ => None,
        }
    }

    /// The wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Delete => "delete",
            Command::Status => "status",
            Command::Version => "version",
            Command::SetConfig => "setconfig",
            Command::UnsetConfig => "unsetconfig",
            Command::GetConfig => "getconfig",
            Command::WebconsoleUrl => "webconsoleurl",
        }
    }

    /// Classification table. Every known command maps to exactly one class.
    pub fn class(&self) -> CommandClass {
        match self {
            Command::Start | Command::Stop | Command::Delete => CommandClass::Serialized,
            Command::Status
            | Command::Version
            | Command::SetConfig
            | Command::UnsetConfig
            | Command::GetConfig
            | Command::WebconsoleUrl => CommandClass::Concurrent,
        }
    }

    /// Whether dispatch builds a fresh config store for this command.
    pub fn takes_config(&self) -> bool {
        matches!(
            self,
            Command::Start | Command::SetConfig | Command::UnsetConfig | Command::GetConfig
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
