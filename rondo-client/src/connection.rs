//! Connection to the rondo server
//!
//! A framed Unix stream plus the `Connect` handshake. Commands go out as
//! [`CommandMessage`]s; replies are read one at a time by the caller.

use std::path::{Path, PathBuf};

use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio_util::codec::Framed;
use uuid::Uuid;

use rondo_protocol::{ClientCodec, ClientMessage, CommandMessage, ServerMessage, PROTOCOL_VERSION};
use rondo_utils::{Result, RondoError};

/// An established, handshaken server connection
pub struct Connection {
    framed: Framed<UnixStream, ClientCodec>,
    client_id: Uuid,
}

impl Connection {
    /// Connect to the server socket and perform the handshake
    pub async fn connect(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RondoError::ServerNotRunning {
                path: PathBuf::from(path),
            });
        }

        let stream = UnixStream::connect(path).await.map_err(|e| {
            RondoError::connection(format!("Failed to connect to {}: {}", path.display(), e))
        })?;

        let mut connection = Self {
            framed: Framed::new(stream, ClientCodec::new()),
            client_id: Uuid::new_v4(),
        };
        connection.handshake().await?;

        Ok(connection)
    }

    async fn handshake(&mut self) -> Result<()> {
        self.send(ClientMessage::Connect {
            client_id: self.client_id,
            protocol_version: PROTOCOL_VERSION,
        })
        .await?;

        match self.recv().await? {
            Some(ServerMessage::Connected {
                protocol_version, ..
            }) if protocol_version == PROTOCOL_VERSION => {
                tracing::debug!("Connected as {}", self.client_id);
                Ok(())
            }
            Some(ServerMessage::Connected {
                protocol_version, ..
            }) => Err(RondoError::ProtocolMismatch {
                client: PROTOCOL_VERSION,
                server: protocol_version,
            }),
            Some(ServerMessage::Error { message }) => Err(RondoError::protocol(message)),
            Some(other) => Err(RondoError::protocol(format!(
                "unexpected response to Connect: {:?}",
                other
            ))),
            None => Err(RondoError::ConnectionClosed),
        }
    }

    /// Send a message to the server
    pub async fn send(&mut self, msg: ClientMessage) -> Result<()> {
        self.framed
            .send(msg)
            .await
            .map_err(|e| RondoError::connection(format!("Failed to send: {}", e)))
    }

    /// Send a packed command
    pub async fn send_command(&mut self, msg: CommandMessage) -> Result<()> {
        self.send(ClientMessage::Command(msg)).await
    }

    /// Next message from the server, `None` once the server hangs up
    pub async fn recv(&mut self) -> Result<Option<ServerMessage>> {
        match self.framed.next().await {
            Some(Ok(msg)) => Ok(Some(msg)),
            Some(Err(e)) => Err(RondoError::connection(format!("Failed to receive: {}", e))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rondo_protocol::ServerCodec;
    use tokio::net::UnixListener;

    /// Accept one connection and answer its handshake with `reply`
    async fn fake_server(listener: UnixListener, reply: ServerMessage) -> Option<ClientMessage> {
        let (stream, _) = listener.accept().await.ok()?;
        let mut framed = Framed::new(stream, ServerCodec::new());
        let first = framed.next().await?.ok()?;
        framed.send(reply).await.ok()?;
        Some(first)
    }

    #[tokio::test]
    async fn test_connect_missing_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.sock");

        let result = Connection::connect(&path).await;
        assert!(matches!(result, Err(RondoError::ServerNotRunning { .. })));
    }

    #[tokio::test]
    async fn test_handshake_sends_protocol_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rondo.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = tokio::spawn(fake_server(
            listener,
            ServerMessage::Connected {
                server_version: "test".into(),
                protocol_version: PROTOCOL_VERSION,
            },
        ));

        let connection = Connection::connect(&path).await;
        assert!(connection.is_ok());

        match server.await.unwrap() {
            Some(ClientMessage::Connect {
                protocol_version, ..
            }) => assert_eq!(protocol_version, PROTOCOL_VERSION),
            other => panic!("expected Connect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handshake_error_reply() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rondo.sock");
        let listener = UnixListener::bind(&path).unwrap();

        tokio::spawn(fake_server(
            listener,
            ServerMessage::Error {
                message: "version mismatch".into(),
            },
        ));

        let result = Connection::connect(&path).await;
        assert!(matches!(result, Err(RondoError::Protocol(m)) if m == "version mismatch"));
    }

    #[tokio::test]
    async fn test_handshake_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rondo.sock");
        let listener = UnixListener::bind(&path).unwrap();

        tokio::spawn(fake_server(
            listener,
            ServerMessage::Connected {
                server_version: "test".into(),
                protocol_version: PROTOCOL_VERSION + 1,
            },
        ));

        let result = Connection::connect(&path).await;
        assert!(matches!(result, Err(RondoError::ProtocolMismatch { .. })));
    }
}
