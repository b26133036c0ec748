//! Command execution: the shared dispatch path and the serialized
//! operations worker.

use crate::handler::{CommandHandler, ConfigFactory};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use vmmd_protocol::{codec, Command, CommandArgs};

/// A serialized-class command waiting its turn.
///
/// Ownership of the connection moves with the job: router to queue to
/// worker. Whoever holds the job writes the single response and closes the
/// stream by dropping it.
pub(crate) struct PendingJob {
    pub command: Command,
    pub args: CommandArgs,
    pub stream: UnixStream,
}

/// Drains the serialized queue one job at a time, in arrival order.
///
/// Runs for the life of the process and exits when the queue closes at
/// shutdown. The next mutating command does not begin before the previous
/// one's response has been written.
pub(crate) async fn run_ops_worker(
    mut queue: mpsc::Receiver<PendingJob>,
    handler: Arc<dyn CommandHandler>,
    factory: Arc<dyn ConfigFactory>,
) {
    while let Some(job) = queue.recv().await {
        execute(job.command, job.args, job.stream, &handler, &factory).await;
    }
    tracing::debug!("Operations queue closed, worker exiting");
}

/// Executes one decoded command and writes its single response.
///
/// Every exit path ends with the stream dropped, closing the connection.
pub(crate) async fn execute(
    command: Command,
    args: CommandArgs,
    mut stream: UnixStream,
    handler: &Arc<dyn CommandHandler>,
    factory: &Arc<dyn ConfigFactory>,
) {
    let payload = match command {
        Command::Stop => handler.stop().await,
        Command::Delete => handler.delete().await,
        Command::Status => handler.status().await,
        Command::Version => handler.get_version().await,
        Command::WebconsoleUrl => handler.get_webconsole_info().await,
        Command::Start | Command::SetConfig | Command::UnsetConfig | Command::GetConfig => {
            // Config-taking commands build a fresh store first; the handler
            // is never invoked if the factory fails.
            let store = match factory.new_store() {
                Ok(store) => store,
                Err(e) => {
                    tracing::error!("{}", e);
                    let msg = format!("Failed to initialize new config store: {}", e);
                    write_response(&mut stream, &codec::encode_error(&msg)).await;
                    return;
                }
            };
            match command {
                Command::Start => handler.start(store, &args).await,
                Command::SetConfig => handler.set_config(store, &args).await,
                Command::UnsetConfig => handler.unset_config(store, &args).await,
                Command::GetConfig => handler.get_config(store, &args).await,
                _ => unreachable!("config-taking commands are matched above"),
            }
        }
    };

    write_response(&mut stream, &codec::encode_result(&payload)).await;
}

/// Writes a response to the connection. Write failures are terminal for
/// the connection: logged, never propagated.
pub(crate) async fn write_response(stream: &mut UnixStream, bytes: &[u8]) {
    if let Err(e) = stream.write_all(bytes).await {
        tracing::error!("Failed writing to socket: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::AsyncReadExt;
    use vmmd_config::{Store, StoreError};

    struct StaticHandler {
        calls: AtomicUsize,
    }

    impl StaticHandler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CommandHandler for StaticHandler {
        async fn start(&self, _config: Store, _args: &CommandArgs) -> Value {
            self.calls.fetch_add(1, Ordering::SeqCst);
            json!({"Name": "vmmd", "Status": "Running"})
        }
        async fn stop(&self) -> Value {
            self.calls.fetch_add(1, Ordering::SeqCst);
            json!({"Success": true})
        }
        async fn delete(&self) -> Value {
            self.calls.fetch_add(1, Ordering::SeqCst);
            json!({"Success": true})
        }
        async fn status(&self) -> Value {
            self.calls.fetch_add(1, Ordering::SeqCst);
            json!({"Status": "Stopped"})
        }
        async fn get_version(&self) -> Value {
            self.calls.fetch_add(1, Ordering::SeqCst);
            json!({"Version": "0.1.0"})
        }
        async fn set_config(&self, _config: Store, _args: &CommandArgs) -> Value {
            self.calls.fetch_add(1, Ordering::SeqCst);
            json!({"Success": true})
        }
        async fn unset_config(&self, _config: Store, _args: &CommandArgs) -> Value {
            self.calls.fetch_add(1, Ordering::SeqCst);
            json!({"Success": true})
        }
        async fn get_config(&self, _config: Store, _args: &CommandArgs) -> Value {
            self.calls.fetch_add(1, Ordering::SeqCst);
            json!({"Configs": {}})
        }
        async fn get_webconsole_info(&self) -> Value {
            self.calls.fetch_add(1, Ordering::SeqCst);
            json!({"Url": "https://127.0.0.1:8443"})
        }
    }

    struct TempFactory {
        dir: tempfile::TempDir,
    }

    impl ConfigFactory for TempFactory {
        fn new_store(&self) -> Result<Store, StoreError> {
            Store::open(self.dir.path().join("config.json"))
        }
    }

    struct FailingFactory;

    impl ConfigFactory for FailingFactory {
        fn new_store(&self) -> Result<Store, StoreError> {
            Err(StoreError::UnknownProperty("corrupt store".to_string()))
        }
    }

    async fn read_all(mut stream: UnixStream) -> Vec<u8> {
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn test_execute_passes_handler_payload_through() {
        let (client, server) = UnixStream::pair().unwrap();
        let handler: Arc<dyn CommandHandler> = StaticHandler::new();
        let factory: Arc<dyn ConfigFactory> = Arc::new(TempFactory {
            dir: tempfile::TempDir::new().unwrap(),
        });

        execute(Command::Status, CommandArgs::new(), server, &handler, &factory).await;

        let response: Value = serde_json::from_slice(&read_all(client).await).unwrap();
        assert_eq!(response, json!({"Status": "Stopped"}));
    }

    #[tokio::test]
    async fn test_execute_factory_failure_skips_handler() {
        let (client, server) = UnixStream::pair().unwrap();
        let handler = StaticHandler::new();
        let dyn_handler: Arc<dyn CommandHandler> = handler.clone();
        let factory: Arc<dyn ConfigFactory> = Arc::new(FailingFactory);

        execute(
            Command::Start,
            CommandArgs::new(),
            server,
            &dyn_handler,
            &factory,
        )
        .await;

        let response: Value = serde_json::from_slice(&read_all(client).await).unwrap();
        let message = response["Error"].as_str().unwrap();
        assert!(message.starts_with("Failed to initialize new config store:"));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_non_config_command_never_calls_factory() {
        let (client, server) = UnixStream::pair().unwrap();
        let handler: Arc<dyn CommandHandler> = StaticHandler::new();
        // A failing factory must not matter for commands without a config.
        let factory: Arc<dyn ConfigFactory> = Arc::new(FailingFactory);

        execute(Command::Stop, CommandArgs::new(), server, &handler, &factory).await;

        let response: Value = serde_json::from_slice(&read_all(client).await).unwrap();
        assert_eq!(response, json!({"Success": true}));
    }
}
