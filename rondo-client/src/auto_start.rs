//! Starting the server on demand
//!
//! Like tmux, running any command starts the server first when nothing is
//! listening on the socket.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tokio::net::UnixStream;

use rondo_utils::{Result, RondoError};

/// Server binary name
const SERVER_BINARY_NAME: &str = "rondo-server";

/// Auto-start settings
#[derive(Debug, Clone)]
pub struct AutoStartConfig {
    /// Start the server if it is not running
    pub enabled: bool,
    /// Give up waiting for a started server after this long (milliseconds)
    pub timeout_ms: u64,
    /// Pause between connection attempts (milliseconds)
    pub retry_delay_ms: u64,
    /// Pause right after spawning (milliseconds)
    pub initial_delay_ms: u64,
}

impl Default for AutoStartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 2000,
            retry_delay_ms: 200,
            initial_delay_ms: 100,
        }
    }
}

/// What [`Launcher::ensure_running`] found or did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStartResult {
    AlreadyRunning,
    Started,
    /// Nothing is listening and auto-start is off
    NotRunning,
}

/// Starts a server for one socket path
#[derive(Debug, Clone)]
pub struct Launcher {
    socket: PathBuf,
    config: AutoStartConfig,
}

impl Launcher {
    pub fn new(socket: impl Into<PathBuf>, config: AutoStartConfig) -> Self {
        Self {
            socket: socket.into(),
            config,
        }
    }

    /// Whether something accepts connections on the socket
    pub async fn is_listening(&self) -> bool {
        self.socket.exists() && UnixStream::connect(&self.socket).await.is_ok()
    }

    /// Make sure a server is listening, starting one if allowed
    pub async fn ensure_running(&self) -> Result<ServerStartResult> {
        if self.is_listening().await {
            return Ok(ServerStartResult::AlreadyRunning);
        }
        if !self.config.enabled {
            return Ok(ServerStartResult::NotRunning);
        }

        self.spawn()?;
        self.wait().await?;
        Ok(ServerStartResult::Started)
    }

    /// Spawn a detached server bound to our socket
    fn spawn(&self) -> Result<()> {
        let binary = find_server_binary()?;
        tracing::info!("Starting {} on {}", binary.display(), self.socket.display());

        Command::new(&binary)
            .arg("--socket")
            .arg(&self.socket)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                RondoError::internal(format!("failed to start {}: {}", binary.display(), e))
            })?;
        Ok(())
    }

    /// Poll the socket until the server answers or the timeout passes
    async fn wait(&self) -> Result<()> {
        let started = Instant::now();
        let timeout = Duration::from_millis(self.config.timeout_ms);

        tokio::time::sleep(Duration::from_millis(self.config.initial_delay_ms)).await;
        while !self.is_listening().await {
            if started.elapsed() >= timeout {
                return Err(RondoError::ConnectionTimeout {
                    seconds: self.config.timeout_ms.div_ceil(1000),
                });
            }
            tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
        }

        tracing::debug!("Server answered after {:?}", started.elapsed());
        Ok(())
    }
}

/// Locate rondo-server next to this executable, then on `PATH`
pub fn find_server_binary() -> Result<PathBuf> {
    let sibling = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(SERVER_BINARY_NAME)))
        .filter(|path| path.is_file());

    sibling
        .or_else(|| which::which(SERVER_BINARY_NAME).ok())
        .ok_or_else(|| {
            RondoError::internal(format!(
                "{} not found next to rondo or on PATH",
                SERVER_BINARY_NAME
            ))
        })
}
