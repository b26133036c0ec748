//! One-shot request/response client.

use crate::error::ClientError;
use serde_json::Value;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use vmmd_protocol::{codec, Command, CommandArgs, Request};

/// Client for the vmmd daemon socket.
pub struct Client {
    socket_path: PathBuf,
}

impl Client {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Sends one command and returns the daemon's payload.
    ///
    /// A `{"Error": ...}` payload - whether from the dispatch engine or
    /// embedded by the handler - is surfaced as [`ClientError::Daemon`].
    pub async fn request(
        &self,
        command: Command,
        args: CommandArgs,
    ) -> Result<Value, ClientError> {
        let envelope = Request::new(command.name()).with_args(args);
        let bytes = codec::encode_request(&envelope)?;

        let mut stream = UnixStream::connect(&self.socket_path).await?;
        stream.write_all(&bytes).await?;
        tracing::debug!("Sent {} request ({} bytes)", command, bytes.len());

        // The daemon writes exactly one response and closes; read to EOF.
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await?;
        if response.is_empty() {
            return Err(ClientError::Abandoned);
        }

        let value = codec::decode_result(&response)?;
        if let Some(message) = value.get("Error").and_then(Value::as_str) {
            return Err(ClientError::Daemon(message.to_string()));
        }
        Ok(value)
    }

    pub async fn start(&self, args: CommandArgs) -> Result<Value, ClientError> {
        self.request(Command::Start, args).await
    }

    pub async fn stop(&self) -> Result<Value, ClientError> {
        self.request(Command::Stop, CommandArgs::new()).await
    }

    pub async fn delete(&self) -> Result<Value, ClientError> {
        self.request(Command::Delete, CommandArgs::new()).await
    }

    pub async fn status(&self) -> Result<Value, ClientError> {
        self.request(Command::Status, CommandArgs::new()).await
    }

    pub async fn version(&self) -> Result<Value, ClientError> {
        self.request(Command::Version, CommandArgs::new()).await
    }

    pub async fn set_config(&self, args: CommandArgs) -> Result<Value, ClientError> {
        self.request(Command::SetConfig, args).await
    }

    pub async fn unset_config(&self, args: CommandArgs) -> Result<Value, ClientError> {
        self.request(Command::UnsetConfig, args).await
    }

    pub async fn get_config(&self, args: CommandArgs) -> Result<Value, ClientError> {
        self.request(Command::GetConfig, args).await
    }

    pub async fn webconsole_url(&self) -> Result<Value, ClientError> {
        self.request(Command::WebconsoleUrl, CommandArgs::new())
            .await
    }
}
