//! Error types for rondo
//!
//! Provides a unified error type used across all rondo crates.

use std::path::PathBuf;

/// Main error type for rondo operations
#[derive(Debug, thiserror::Error)]
pub enum RondoError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Connection Errors ===

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Server not running at {path}")]
    ServerNotRunning { path: PathBuf },

    #[error("Connection timeout after {seconds}s")]
    ConnectionTimeout { seconds: u64 },

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    // === Protocol Errors ===

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Protocol version mismatch: client={client}, server={server}")]
    ProtocolMismatch { client: u32, server: u32 },

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    // === Session Errors ===

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("duplicate session: {0}")]
    SessionExists(String),

    #[error("no window {0}")]
    WindowNotFound(u32),

    #[error("index in use: {0}")]
    IndexInUse(u32),

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RondoError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether nobody is listening on the socket
    ///
    /// These are the failures starting a server can fix.
    pub fn is_server_unavailable(&self) -> bool {
        match self {
            Self::ServerNotRunning { .. } | Self::ConnectionTimeout { .. } => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused
            ),
            Self::Connection(msg) => {
                msg.contains("Connection refused") || msg.contains("No such file or directory")
            }
            _ => false,
        }
    }
}

/// Result type alias using RondoError
pub type Result<T> = std::result::Result<T, RondoError>;
