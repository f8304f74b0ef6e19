//! Logging infrastructure for rondo
//!
//! Provides unified logging setup using the tracing ecosystem.

use std::path::Path;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{paths, Result, RondoError};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "RONDO_LOG";

/// Log output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Log to stderr
    Stderr,
    /// Log to file (server daemon, attached client)
    File,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output destination
    pub output: LogOutput,
    /// Log level filter (e.g., "info", "rondo_server=debug,tokio=warn")
    pub filter: String,
    /// Include span events (enter/exit)
    pub span_events: bool,
    /// Include file/line in logs
    pub file_line: bool,
    /// Log file name inside the log directory
    pub file_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: "info".into(),
            span_events: false,
            file_line: false,
            file_name: SERVER_LOG.into(),
        }
    }
}

const SERVER_LOG: &str = "rondo.log";
const CLIENT_LOG: &str = "client.log";

/// `RONDO_LOG` if set, else `fallback`
fn env_filter_or(fallback: &str) -> String {
    std::env::var(LOG_ENV).unwrap_or_else(|_| fallback.to_string())
}

impl LogConfig {
    /// Client: file logging at `warn`, the terminal belongs to the user
    pub fn client() -> Self {
        Self {
            output: LogOutput::File,
            filter: env_filter_or("warn"),
            file_name: CLIENT_LOG.into(),
            ..Self::default()
        }
    }

    /// Server daemon: file logging with spans and source locations
    pub fn server() -> Self {
        Self {
            output: LogOutput::File,
            filter: env_filter_or("info"),
            span_events: true,
            file_line: true,
            ..Self::default()
        }
    }

    /// Server in the foreground: verbose stderr
    pub fn foreground() -> Self {
        Self {
            filter: env_filter_or("debug"),
            file_line: true,
            ..Self::default()
        }
    }
}

/// Initialize logging with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(LogConfig::default())
}

/// Install the global subscriber described by `config`
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| RondoError::config(format!("Invalid log filter: {}", e)))?;

    let spans = if config.span_events {
        FmtSpan::ENTER | FmtSpan::EXIT
    } else {
        FmtSpan::NONE
    };
    let layer = fmt::layer()
        .with_target(true)
        .with_span_events(spans)
        .with_file(config.file_line)
        .with_line_number(config.file_line);

    let installed = match config.output {
        LogOutput::Stderr => tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_writer(std::io::stderr))
            .try_init(),
        LogOutput::File => {
            let file = open_log_file(&paths::log_dir(), &config.file_name)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.with_writer(std::sync::Mutex::new(file)).with_ansi(false))
                .try_init()
        }
    };

    installed.map_err(|e| RondoError::internal(format!("Failed to init logging: {}", e)))
}

/// Open (creating if needed) a log file for appending
fn open_log_file(log_dir: &Path, file_name: &str) -> Result<std::fs::File> {
    std::fs::create_dir_all(log_dir).map_err(|e| RondoError::FileWrite {
        path: log_dir.to_path_buf(),
        source: e,
    })?;

    let log_path = log_dir.join(file_name);
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| RondoError::FileWrite {
            path: log_path,
            source: e,
        })
}
