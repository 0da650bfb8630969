//! IPC server implementation

use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thermo_api::{
    ClientInfo, ClientRole, Command, ErrorCode, ErrorInfo, Event, Request, Response,
};
use thermo_util::ClientId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, RwLock, broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::{IpcError, IpcResult};

/// Message from the server to the daemon loop
#[derive(Debug)]
pub enum ServerMessage {
    Request {
        client_id: ClientId,
        request: Request,
    },
    ClientConnected {
        client_id: ClientId,
        info: ClientInfo,
    },
    ClientDisconnected {
        client_id: ClientId,
    },
}

/// IPC Server
pub struct IpcServer {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    clients: Arc<RwLock<HashMap<ClientId, ClientHandle>>>,
    event_tx: broadcast::Sender<Event>,
    message_tx: mpsc::UnboundedSender<ServerMessage>,
    message_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<ServerMessage>>>>,
}

struct ClientHandle {
    info: ClientInfo,
    response_tx: mpsc::UnboundedSender<String>,
    subscribed: bool,
}

impl IpcServer {
    /// Create a new IPC server
    pub fn new(socket_path: impl AsRef<Path>) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
            listener: None,
            clients: Arc::new(RwLock::new(HashMap::new())),
            event_tx,
            message_tx,
            message_rx: Arc::new(Mutex::new(Some(message_rx))),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Start listening
    pub async fn start(&mut self) -> IpcResult<()> {
        // A stale socket from a previous run blocks bind
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }

        if let Some(parent) = self.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        // Any local user may connect as an observer
        std::fs::set_permissions(&self.socket_path, std::fs::Permissions::from_mode(0o666))?;

        info!(path = %self.socket_path.display(), "IPC server listening");

        self.listener = Some(listener);

        Ok(())
    }

    /// Get receiver for server messages
    pub async fn take_message_receiver(&self) -> Option<mpsc::UnboundedReceiver<ServerMessage>> {
        self.message_rx.lock().await.take()
    }

    /// Accept connections in a loop
    pub async fn run(&self) -> IpcResult<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| IpcError::ServerError("Server not started".into()))?;

        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let client_id = ClientId::new();
                    let uid = get_peer_uid(&stream);
                    let role = role_for_uid(uid, nix::unistd::getuid().as_raw());

                    let info = ClientInfo::new(role);
                    let info = match uid {
                        Some(u) => info.with_uid(u),
                        None => info,
                    };

                    debug!(client_id = %client_id, uid = ?uid, role = ?role, "Accepted connection");

                    self.handle_client(stream, client_id, info).await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    async fn handle_client(&self, stream: UnixStream, client_id: ClientId, info: ClientInfo) {
        let (read_half, write_half) = stream.into_split();
        let (response_tx, mut response_rx) = mpsc::unbounded_channel::<String>();

        self.clients.write().await.insert(
            client_id.clone(),
            ClientHandle {
                info: info.clone(),
                response_tx,
                subscribed: false,
            },
        );

        let _ = self.message_tx.send(ServerMessage::ClientConnected {
            client_id: client_id.clone(),
            info,
        });

        // Reader: parse requests, track subscription state
        let clients = self.clients.clone();
        let message_tx = self.message_tx.clone();
        let reader_id = client_id.clone();

        tokio::spawn(async move {
            let mut reader = BufReader::new(read_half);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        debug!(client_id = %reader_id, "Client disconnected (EOF)");
                        break;
                    }
                    Ok(_) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }

                        match serde_json::from_str::<Request>(line) {
                            Ok(request) => {
                                let subscribe = match request.command {
                                    Command::SubscribeEvents => Some(true),
                                    Command::UnsubscribeEvents => Some(false),
                                    _ => None,
                                };
                                if let Some(subscribed) = subscribe {
                                    if let Some(handle) = clients.write().await.get_mut(&reader_id) {
                                        handle.subscribed = subscribed;
                                    }
                                }

                                let _ = message_tx.send(ServerMessage::Request {
                                    client_id: reader_id.clone(),
                                    request,
                                });
                            }
                            Err(e) => {
                                warn!(client_id = %reader_id, error = %e, "Invalid request");
                                let response = invalid_request_response(line, &e);
                                match serde_json::to_string(&response) {
                                    Ok(json) => {
                                        if let Some(handle) = clients.read().await.get(&reader_id) {
                                            let _ = handle.response_tx.send(json);
                                        }
                                    }
                                    Err(e) => warn!(error = %e, "Failed to encode response"),
                                }
                            }
                        }
                    }
                    Err(e) => {
                        debug!(client_id = %reader_id, error = %e, "Read error");
                        break;
                    }
                }
            }

            // Dropping the sender ends the writer
            clients.write().await.remove(&reader_id);
        });

        // Writer: responses plus events for subscribed clients
        let mut event_rx = self.event_tx.subscribe();
        let clients = self.clients.clone();
        let message_tx = self.message_tx.clone();
        let writer_id = client_id;

        tokio::spawn(async move {
            let mut writer = write_half;

            loop {
                let line = tokio::select! {
                    response = response_rx.recv() => match response {
                        Some(response) => response,
                        None => break,
                    },

                    event = event_rx.recv() => match event {
                        Ok(event) => {
                            let subscribed = clients
                                .read()
                                .await
                                .get(&writer_id)
                                .map(|h| h.subscribed)
                                .unwrap_or(false);
                            if !subscribed {
                                continue;
                            }
                            match serde_json::to_string(&event) {
                                Ok(json) => json,
                                Err(e) => {
                                    warn!(error = %e, "Failed to encode event");
                                    continue;
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(client_id = %writer_id, skipped, "Client lagging; events dropped");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                };

                let mut msg = line;
                msg.push('\n');
                if let Err(e) = writer.write_all(msg.as_bytes()).await {
                    debug!(client_id = %writer_id, error = %e, "Write error");
                    break;
                }
            }

            let _ = message_tx.send(ServerMessage::ClientDisconnected {
                client_id: writer_id.clone(),
            });
            clients.write().await.remove(&writer_id);
        });
    }

    /// Send a response to a specific client
    pub async fn send_response(&self, client_id: &ClientId, response: Response) -> IpcResult<()> {
        let json = serde_json::to_string(&response)?;

        let clients = self.clients.read().await;
        if let Some(handle) = clients.get(client_id) {
            handle
                .response_tx
                .send(json)
                .map_err(|_| IpcError::ConnectionClosed)?;
        }

        Ok(())
    }

    /// Broadcast an event to all subscribed clients
    pub fn broadcast_event(&self, event: Event) {
        let _ = self.event_tx.send(event);
    }

    /// Get client info
    pub async fn get_client_info(&self, client_id: &ClientId) -> Option<ClientInfo> {
        let clients = self.clients.read().await;
        clients.get(client_id).map(|h| h.info.clone())
    }

    /// Get connected client count
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Remove the socket file
    pub fn shutdown(&self) {
        if self.socket_path.exists() {
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Error reply for a line that does not parse as a request, echoing its
/// `request_id` when one can be read
fn invalid_request_response(line: &str, error: &serde_json::Error) -> Response {
    let request_id = serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|value| value.get("request_id").and_then(serde_json::Value::as_u64))
        .unwrap_or(0);

    Response::error(
        request_id,
        ErrorInfo::new(ErrorCode::InvalidRequest, format!("Invalid request: {}", error)),
    )
}

/// Root and the daemon's own user administer; everyone else observes
pub fn role_for_uid(uid: Option<u32>, daemon_uid: u32) -> ClientRole {
    match uid {
        Some(0) => ClientRole::Admin,
        Some(u) if u == daemon_uid => ClientRole::Admin,
        _ => ClientRole::Observer,
    }
}

/// Get peer UID from Unix socket
fn get_peer_uid(stream: &UnixStream) -> Option<u32> {
    use std::os::unix::io::AsFd;

    let fd = stream.as_fd();

    nix::sys::socket::getsockopt(&fd, nix::sys::socket::sockopt::PeerCredentials)
        .ok()
        .map(|cred| cred.uid())
}
