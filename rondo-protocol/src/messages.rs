//! Message types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A parsed command instance in transit
///
/// `payload` holds the instance serialized by its descriptor: fixed-size
/// header first, then the variable-length fields. `name` selects the
/// descriptor that will deserialize it on the far side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    /// Canonical command name
    pub name: String,
    /// Session the client wants the command to run against, if it named one
    pub session: Option<String>,
    /// Serialized command instance
    pub payload: Vec<u8>,
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Initial handshake
    Connect {
        client_id: Uuid,
        protocol_version: u32,
    },

    /// Run a command on the server
    Command(CommandMessage),
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// Handshake accepted
    Connected {
        server_version: String,
        protocol_version: u32,
    },

    /// A line of command output
    Print { line: String },

    /// A command failed; one-shot clients exit unsuccessfully
    Error { message: String },

    /// The command finished; one-shot clients exit
    Exit,

    /// The client is now attached to a session
    Attached { session: String },

    /// The attached session changed and must be redisplayed
    Redraw { status: String },

    /// The client has been detached from its session
    Detached,
}
