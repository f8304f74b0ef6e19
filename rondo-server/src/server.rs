//! Socket listener and per-connection tasks
//!
//! Each connection gets a reader that decodes frames and a writer that
//! drains the client's outgoing queue. Readers hand commands to the
//! dispatcher; a payload that fails to decode closes the connection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use rondo_cmd::{unpack, CmdTable};
use rondo_protocol::{ClientMessage, ServerCodec, ServerMessage, PROTOCOL_VERSION};
use rondo_utils::{Result, RondoError};

use crate::config::AppConfig;
use crate::dispatcher::{Dispatcher, Event};
use crate::registry::ClientRegistry;

/// Outgoing queue depth per client
const CLIENT_QUEUE: usize = 256;

/// Dispatcher queue depth
const EVENT_QUEUE: usize = 1024;

/// How long shutdown waits for connections to flush
const DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);

/// State shared by every connection task
#[derive(Clone)]
pub struct SharedState {
    pub registry: Arc<ClientRegistry>,
    pub table: Arc<CmdTable>,
    pub events: mpsc::Sender<Event>,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl SharedState {
    /// Subscribe to the shutdown signal
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }
}

/// The server: a listening socket plus the dispatcher behind it
pub struct Server {
    socket_path: PathBuf,
    config: Arc<AppConfig>,
}

impl Server {
    pub fn new(socket_path: impl Into<PathBuf>, config: AppConfig) -> Self {
        Self {
            socket_path: socket_path.into(),
            config: Arc::new(config),
        }
    }

    /// Bind the socket and serve until a command stops the server
    pub async fn run(self) -> Result<()> {
        let listener = bind(&self.socket_path)?;
        info!("Listening on {}", self.socket_path.display());

        let registry = Arc::new(ClientRegistry::new());
        let table = Arc::new(CmdTable::new());
        let (shutdown_tx, _) = broadcast::channel(1);
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);

        let mut dispatcher = Dispatcher::new(
            Arc::clone(&table),
            Arc::clone(&registry),
            Arc::clone(&self.config),
            shutdown_tx.clone(),
        );
        dispatcher.run_startup();
        if dispatcher.is_stopped() {
            info!("Stopped by a startup command");
            remove_socket(&self.socket_path);
            return Ok(());
        }
        let dispatcher = tokio::spawn(dispatcher.run(events_rx));

        let state = SharedState {
            registry,
            table,
            events: events_tx,
            shutdown_tx,
        };
        run_accept_loop(listener, state).await;

        let _ = dispatcher.await;
        remove_socket(&self.socket_path);
        info!("rondo server stopped");
        Ok(())
    }
}

/// Bind the listening socket, replacing a stale socket file
fn bind(path: &Path) -> Result<UnixListener> {
    if let Some(dir) = path.parent() {
        rondo_utils::ensure_dir(dir)?;
    }

    if path.exists() {
        if std::os::unix::net::UnixStream::connect(path).is_ok() {
            return Err(RondoError::connection(format!(
                "server already running at {}",
                path.display()
            )));
        }
        debug!("Removing stale socket {}", path.display());
        remove_socket(path);
    }

    UnixListener::bind(path).map_err(|e| {
        RondoError::connection(format!("failed to bind {}: {}", path.display(), e))
    })
}

fn remove_socket(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove socket {}: {}", path.display(), e);
        }
    }
}

/// Accept connections until shutdown, then wait briefly for them to flush
pub async fn run_accept_loop(listener: UnixListener, state: SharedState) {
    let mut shutdown_rx = state.subscribe_shutdown();
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _)) => {
                        debug!("New connection");
                        connections.spawn(handle_client(stream, state.clone()));
                    }
                    Err(e) => {
                        error!("Accept error: {}", e);
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, stopping accept loop");
                break;
            }
        }
    }

    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while connections.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!("Connections still open at shutdown");
    }
}

/// Serve one connection until it closes, misbehaves, or the server stops
pub async fn handle_client(stream: UnixStream, state: SharedState) {
    let (mut sink, mut frames) = Framed::new(stream, ServerCodec::new()).split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(CLIENT_QUEUE);
    let client_id = state.registry.register_client(tx.clone());
    debug!(
        "Client {} registered ({} connected)",
        client_id,
        state.registry.client_count()
    );

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = sink.send(message).await {
                debug!("Write failed: {}", e);
                break;
            }
        }
    });

    let mut shutdown_rx = state.subscribe_shutdown();
    let mut connected = false;

    loop {
        let frame = tokio::select! {
            frame = frames.next() => frame,
            _ = shutdown_rx.recv() => break,
        };

        let message = match frame {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                warn!("Client {} sent a bad frame: {}", client_id, e);
                break;
            }
            None => break,
        };

        match message {
            ClientMessage::Connect {
                client_id: uuid,
                protocol_version,
            } => {
                info!(
                    "Client {} ({}) connecting with protocol version {}",
                    client_id, uuid, protocol_version
                );
                if protocol_version != PROTOCOL_VERSION {
                    let message = RondoError::ProtocolMismatch {
                        client: protocol_version,
                        server: PROTOCOL_VERSION,
                    }
                    .to_string();
                    let _ = tx.send(ServerMessage::Error { message }).await;
                    break;
                }
                connected = true;
                let _ = tx
                    .send(ServerMessage::Connected {
                        server_version: env!("CARGO_PKG_VERSION").to_string(),
                        protocol_version: PROTOCOL_VERSION,
                    })
                    .await;
            }
            ClientMessage::Command(msg) if connected => match unpack(&state.table, &msg) {
                Ok(cmd) => {
                    let event = Event::Command {
                        client: client_id,
                        session: msg.session,
                        cmd,
                    };
                    if state.events.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Client {} protocol violation in {}: {}", client_id, msg.name, e);
                    break;
                }
            },
            ClientMessage::Command(_) => {
                warn!("Client {} sent a command before connecting", client_id);
                break;
            }
        }
    }

    drop(tx);
    if state.events.send(Event::Disconnected(client_id)).await.is_err() {
        // The dispatcher is gone; release the registry's queue ourselves
        state.registry.unregister_client(client_id);
    }
    let _ = writer.await;
    debug!("Client {} connection closed", client_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rondo_cmd::{pack, parse_argv};
    use rondo_protocol::{ClientCodec, CommandMessage};
    use tempfile::tempdir;
    use uuid::Uuid;

    type Client = Framed<UnixStream, ClientCodec>;

    async fn start(dir: &Path) -> (PathBuf, tokio::task::JoinHandle<Result<()>>) {
        let path = dir.join("rondo.sock");
        let server = Server::new(&path, AppConfig::default());
        let handle = tokio::spawn(server.run());
        for _ in 0..100 {
            if path.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        (path, handle)
    }

    async fn connect(path: &Path) -> Client {
        let stream = UnixStream::connect(path).await.unwrap();
        let mut client = Framed::new(stream, ClientCodec::new());
        client
            .send(ClientMessage::Connect {
                client_id: Uuid::new_v4(),
                protocol_version: PROTOCOL_VERSION,
            })
            .await
            .unwrap();
        assert!(matches!(
            client.next().await,
            Some(Ok(ServerMessage::Connected { .. }))
        ));
        client
    }

    fn command(line: &str, session: Option<&str>) -> ClientMessage {
        let argv: Vec<String> = line.split_whitespace().map(String::from).collect();
        let cmd = parse_argv(&CmdTable::new(), &argv).unwrap();
        ClientMessage::Command(pack(&cmd, session))
    }

    #[tokio::test]
    async fn test_one_shot_command_and_shutdown() {
        let dir = tempdir().unwrap();
        let (path, handle) = start(dir.path()).await;

        let mut client = connect(&path).await;
        client.send(command("new-session -d -s main", None)).await.unwrap();
        assert_eq!(client.next().await.unwrap().unwrap(), ServerMessage::Exit);

        let mut client = connect(&path).await;
        client.send(command("ls", None)).await.unwrap();
        assert!(matches!(
            client.next().await.unwrap().unwrap(),
            ServerMessage::Print { line } if line.starts_with("main: 1 windows")
        ));
        assert_eq!(client.next().await.unwrap().unwrap(), ServerMessage::Exit);

        let mut client = connect(&path).await;
        client.send(command("kill-server", None)).await.unwrap();
        assert_eq!(client.next().await.unwrap().unwrap(), ServerMessage::Exit);

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_one_shot_command_exits_client() {
        let dir = tempdir().unwrap();
        let (path, _handle) = start(dir.path()).await;

        let mut client = connect(&path).await;
        client.send(command("new-session -d -s main", None)).await.unwrap();
        assert_eq!(client.next().await.unwrap().unwrap(), ServerMessage::Exit);

        let mut client = connect(&path).await;
        client.send(command("swap-window main 7", None)).await.unwrap();
        assert_eq!(
            client.next().await.unwrap().unwrap(),
            ServerMessage::Error {
                message: "no window 7".into()
            }
        );
        let next = tokio::time::timeout(std::time::Duration::from_secs(2), client.next())
            .await
            .unwrap();
        assert_eq!(next.unwrap().unwrap(), ServerMessage::Exit);

        let mut client = connect(&path).await;
        client.send(command("ls", Some("ghost"))).await.unwrap();
        assert!(matches!(
            client.next().await.unwrap().unwrap(),
            ServerMessage::Error { message } if message == "session not found: ghost"
        ));
        assert_eq!(client.next().await.unwrap().unwrap(), ServerMessage::Exit);
    }

    #[tokio::test]
    async fn test_truncated_payload_closes_connection() {
        let dir = tempdir().unwrap();
        let (path, _handle) = start(dir.path()).await;

        let mut client = connect(&path).await;
        client
            .send(ClientMessage::Command(CommandMessage {
                name: "swap-window".into(),
                session: None,
                payload: vec![0, 0, 0],
            }))
            .await
            .unwrap();

        assert!(client.next().await.is_none());
    }

    #[tokio::test]
    async fn test_protocol_mismatch() {
        let dir = tempdir().unwrap();
        let (path, _handle) = start(dir.path()).await;

        let stream = UnixStream::connect(&path).await.unwrap();
        let mut client = Framed::new(stream, ClientCodec::new());
        client
            .send(ClientMessage::Connect {
                client_id: Uuid::new_v4(),
                protocol_version: PROTOCOL_VERSION + 1,
            })
            .await
            .unwrap();

        assert!(matches!(
            client.next().await,
            Some(Ok(ServerMessage::Error { .. }))
        ));
        assert!(client.next().await.is_none());
    }

    #[tokio::test]
    async fn test_command_before_connect_closes_connection() {
        let dir = tempdir().unwrap();
        let (path, _handle) = start(dir.path()).await;

        let stream = UnixStream::connect(&path).await.unwrap();
        let mut client = Framed::new(stream, ClientCodec::new());
        client.send(command("ls", None)).await.unwrap();

        assert!(client.next().await.is_none());
    }

    #[tokio::test]
    async fn test_bind_replaces_stale_socket() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stale.sock");
        std::fs::write(&path, b"").unwrap();

        assert!(bind(&path).is_ok());
    }

    #[tokio::test]
    async fn test_bind_refuses_live_socket() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("live.sock");
        let _listener = bind(&path).unwrap();

        assert!(matches!(bind(&path), Err(RondoError::Connection(_))));
    }
}
