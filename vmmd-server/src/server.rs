//! Unix-socket server: connection acceptor and per-connection router.

use crate::dispatch::{self, PendingJob};
use crate::error::ServerError;
use crate::handler::{CommandHandler, ConfigFactory};
use std::fs;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use vmmd_protocol::{codec, Command, CommandClass, READ_BUFFER_SIZE};

/// Capacity of the serialized-operations queue. A full queue rejects new
/// mutating requests immediately; it never blocks the router.
pub const OPS_QUEUE_CAPACITY: usize = 10;

/// Error message returned when the serialized queue is full.
pub(crate) const QUEUE_FULL_MSG: &str =
    "Sockets channel capacity reached, unable to add new request";

/// Server statistics.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub connections_total: AtomicU64,
    pub requests_total: AtomicU64,
    pub rejected_total: AtomicU64,
    pub errors_total: AtomicU64,
}

/// Control-plane server for vmmd.
pub struct Server {
    socket_path: PathBuf,
    handler: Arc<dyn CommandHandler>,
    factory: Arc<dyn ConfigFactory>,
    stats: Arc<ServerStats>,
    shutdown: broadcast::Sender<()>,
    running: AtomicBool,
}

impl Server {
    /// Creates a new server. Nothing is bound until [`Server::run`].
    pub fn new(
        socket_path: impl Into<PathBuf>,
        handler: Arc<dyn CommandHandler>,
        factory: Arc<dyn ConfigFactory>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            socket_path: socket_path.into(),
            handler,
            factory,
            stats: Arc::new(ServerStats::default()),
            shutdown: shutdown_tx,
            running: AtomicBool::new(false),
        }
    }

    /// Runs the server until shutdown.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = bind_socket(&self.socket_path)?;
        self.running.store(true, Ordering::SeqCst);
        tracing::info!("Listening on {}", self.socket_path.display());

        let (ops_tx, ops_rx) = mpsc::channel::<PendingJob>(OPS_QUEUE_CAPACITY);
        let worker = tokio::spawn(dispatch::run_ops_worker(
            ops_rx,
            self.handler.clone(),
            self.factory.clone(),
        ));

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, _addr)) => {
                            self.stats.connections_total.fetch_add(1, Ordering::Relaxed);
                            let ops_tx = ops_tx.clone();
                            let handler = self.handler.clone();
                            let factory = self.factory.clone();
                            let stats = self.stats.clone();
                            tokio::spawn(async move {
                                route_connection(stream, ops_tx, handler, factory, stats).await;
                            });
                        }
                        Err(e) => {
                            // Accept failures are transient; the loop never
                            // stops for one.
                            tracing::error!("Error establishing communication: {}", e);
                            self.stats.errors_total.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Server shutting down");
                    break;
                }
            }
        }

        // Closing the queue lets the worker drain what is already enqueued
        // and exit.
        drop(ops_tx);
        let _ = worker.await;

        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = fs::remove_file(&self.socket_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove socket file: {}", e);
            }
        }
        Ok(())
    }

    /// Initiates server shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Returns whether the server is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Returns server statistics.
    pub fn stats(&self) -> &ServerStats {
        &self.stats
    }
}

/// Binds the listening socket, clearing a stale socket file left by a dead
/// daemon. A path another process still answers on is a startup error, as
/// is a non-socket file at the path.
fn bind_socket(path: &Path) -> Result<UnixListener, ServerError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    if path.exists() {
        let metadata = fs::symlink_metadata(path)?;
        if !metadata.file_type().is_socket() {
            return Err(ServerError::NotASocket {
                path: path.to_path_buf(),
            });
        }
        match std::os::unix::net::UnixStream::connect(path) {
            Ok(_stream) => {
                return Err(ServerError::SocketInUse {
                    path: path.to_path_buf(),
                });
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::ConnectionRefused
                    || e.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::debug!("Removing stale socket file {}", path.display());
                fs::remove_file(path)?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(UnixListener::bind(path)?)
}

/// Handles one accepted connection: a single read, decode, classify, and
/// either enqueue (serialized), execute in place (concurrent), or reject
/// (unknown). Decode failures abandon the connection without a response.
async fn route_connection(
    mut stream: UnixStream,
    ops_tx: mpsc::Sender<PendingJob>,
    handler: Arc<dyn CommandHandler>,
    factory: Arc<dyn ConfigFactory>,
    stats: Arc<ServerStats>,
) {
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let n = match stream.read(&mut buf).await {
        Ok(n) => n,
        Err(e) => {
            tracing::error!("Error reading from socket: {}", e);
            stats.errors_total.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    let envelope = match codec::decode_request(&buf, n) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::error!("Error decoding request: {}", e);
            stats.errors_total.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };
    tracing::debug!("Received request: {}", envelope.command);
    stats.requests_total.fetch_add(1, Ordering::Relaxed);

    match Command::parse(&envelope.command) {
        // Mutating commands change VM state and are slow; they run one at a
        // time through the worker so they never interleave. Enqueue is
        // non-blocking: a full queue fails the request immediately.
        Some(command) if command.class() == CommandClass::Serialized => {
            let job = PendingJob {
                command,
                args: envelope.args,
                stream,
            };
            if let Err(rejected) = ops_tx.try_send(job) {
                tracing::error!("Channel capacity reached, unable to add new request");
                stats.rejected_total.fetch_add(1, Ordering::Relaxed);
                let mut stream = rejected.into_inner().stream;
                dispatch::write_response(&mut stream, &codec::encode_error(QUEUE_FULL_MSG)).await;
            }
        }
        // Read-only and config-scoped commands run right here, overlapping
        // freely with each other and with the worker's current job.
        Some(command) => {
            dispatch::execute(command, envelope.args, stream, &handler, &factory).await;
        }
        None => {
            tracing::error!("Unknown command supplied: {}", envelope.command);
            stats.rejected_total.fetch_add(1, Ordering::Relaxed);
            let msg = format!("Unknown command supplied: {}", envelope.command);
            dispatch::write_response(&mut stream, &codec::encode_error(&msg)).await;
        }
    }
}
