//! Unix domain socket server for IPC
//!
//! Provides request-response communication and push notifications for
//! state events to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::engine::HotkeyController;
use crate::events::StateEvent;

use super::protocol::{
    DaemonStatus, Notification, Request, Response, ValidationReport, MAX_FRAME_LEN,
};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
}

/// State shared with every client handler
struct Shared {
    controller: HotkeyController,
    /// Source of notifications for subscribed clients
    event_tx: broadcast::Sender<StateEvent>,
    state: RwLock<ServerState>,
}

struct ServerState {
    start_time: Instant,
    /// Whether a recording session is running
    recording: bool,
}

/// A request as read off the wire, or why it could not be parsed
type Incoming = std::result::Result<Request, String>;

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        controller: HotkeyController,
        event_tx: broadcast::Sender<StateEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            shared: Arc::new(Shared {
                controller,
                event_tx,
                state: RwLock::new(ServerState {
                    start_time: Instant::now(),
                    recording: false,
                }),
            }),
            shutdown_tx,
        })
    }

    /// Track whether a recording session is running
    pub async fn set_recording(&self, recording: bool) {
        let mut state = self.shared.state.write().await;
        if state.recording != recording {
            info!(recording, "IPC server: recording state updated");
        }
        state.recording = recording;
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let shared = Arc::clone(&self.shared);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, shared) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    ///
    /// Requests are read on a separate task so that notifications can be
    /// pushed while the client is idle.
    async fn handle_client(stream: UnixStream, shared: Arc<Shared>) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let (request_tx, request_rx) = mpsc::channel::<Incoming>(8);
        let reader_task = tokio::spawn(Self::read_requests(reader, request_tx));

        let result = Self::serve(&mut writer, request_rx, &shared).await;
        reader_task.abort();
        result
    }

    async fn serve(
        writer: &mut OwnedWriteHalf,
        mut request_rx: mpsc::Receiver<Incoming>,
        shared: &Arc<Shared>,
    ) -> Result<()> {
        let mut events = shared.event_tx.subscribe();
        let mut is_subscribed = false;

        loop {
            tokio::select! {
                incoming = request_rx.recv() => {
                    let Some(incoming) = incoming else {
                        debug!("client disconnected");
                        return Ok(());
                    };

                    let response = match incoming {
                        Ok(request) => {
                            debug!(?request, "received request");
                            let (response, subscribe) = Self::process_request(request, shared).await;
                            if subscribe && !is_subscribed {
                                // Start from now, not from whatever queued up before
                                events = shared.event_tx.subscribe();
                                is_subscribed = true;
                                debug!("client subscribed to notifications");
                            }
                            response
                        }
                        Err(message) => Response::error("bad_request", message),
                    };

                    Self::send_message(writer, &response).await?;
                }

                event = events.recv(), if is_subscribed => {
                    match event {
                        Ok(event) => {
                            Self::send_message(writer, &Notification::StateEvent(event)).await?;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "subscriber lagged, notifications dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            is_subscribed = false;
                        }
                    }
                }
            }
        }
    }

    /// Read length-prefixed requests until the client goes away
    async fn read_requests(mut reader: OwnedReadHalf, request_tx: mpsc::Sender<Incoming>) {
        let mut len_buf = [0u8; 4];

        loop {
            // Read message length (4-byte little-endian)
            match reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return,
                Err(e) => {
                    warn!(?e, "failed to read from client");
                    return;
                }
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > MAX_FRAME_LEN {
                warn!(len, "message too large, disconnecting");
                return;
            }

            // Read message body
            let mut msg_buf = vec![0u8; len];
            if let Err(e) = reader.read_exact(&mut msg_buf).await {
                warn!(?e, "failed to read message body");
                return;
            }

            let incoming = serde_json::from_slice::<Request>(&msg_buf)
                .map_err(|e| format!("failed to parse request: {e}"));

            if request_tx.send(incoming).await.is_err() {
                return;
            }
        }
    }

    /// Send a length-prefixed JSON message
    async fn send_message<T: serde::Serialize>(
        writer: &mut OwnedWriteHalf,
        msg: &T,
    ) -> Result<()> {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        writer.write_all(&msg_len).await?;
        writer.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    /// Returns (Response, should_subscribe)
    async fn process_request(request: Request, shared: &Arc<Shared>) -> (Response, bool) {
        match request {
            Request::Ping => (Response::Pong, false),

            Request::GetStatus => {
                let state = shared.state.read().await;
                let status = DaemonStatus::from_snapshot(
                    &shared.controller.snapshot(),
                    state.recording,
                    state.start_time.elapsed().as_secs(),
                );
                (Response::Status(status), false)
            }

            Request::ReloadConfig => {
                let controller = shared.controller.clone();
                let result = tokio::task::spawn_blocking(move || {
                    let validation = controller.reload_config()?;
                    if let Err(e) = controller.resume_if_possible() {
                        warn!(?e, "failed to resume after reload");
                    }
                    Ok::<_, crate::config::ConfigError>((validation, controller.is_hotkey_active()))
                })
                .await;

                let response = match result {
                    Ok(Ok((validation, hotkey_active))) => {
                        info!(?validation, hotkey_active, "configuration reloaded via IPC");
                        Response::Reloaded {
                            validation: ValidationReport::from(&validation),
                            hotkey_active,
                        }
                    }
                    Ok(Err(e)) => Response::error("config_error", e.to_string()),
                    Err(e) => Response::error("internal", e.to_string()),
                };
                (response, false)
            }

            Request::Resume => {
                let controller = shared.controller.clone();
                let result =
                    tokio::task::spawn_blocking(move || controller.resume_if_possible()).await;

                let response = match result {
                    Ok(Ok(active)) => Response::Listening { active },
                    Ok(Err(e)) => Response::error("listener_error", e.to_string()),
                    Err(e) => Response::error("internal", e.to_string()),
                };
                (response, false)
            }

            Request::Suspend => {
                let controller = shared.controller.clone();
                let result = tokio::task::spawn_blocking(move || {
                    controller.suspend();
                    controller.is_hotkey_active()
                })
                .await;

                let response = match result {
                    Ok(active) => Response::Listening { active },
                    Err(e) => Response::error("internal", e.to_string()),
                };
                (response, false)
            }

            Request::Subscribe => (Response::Subscribed, true),
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}
