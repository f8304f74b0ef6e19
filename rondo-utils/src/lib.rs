//! rondo-utils: Common utilities shared across rondo crates
//!
//! This crate provides:
//! - Unified error types ([`RondoError`], [`Result`])
//! - Logging infrastructure ([`init_logging`], [`LogConfig`])
//! - XDG-compliant path utilities ([`paths`] module)

pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Result, RondoError};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogOutput};

pub use paths::{config_dir, config_file, ensure_dir, log_dir, runtime_dir, socket_path, state_dir};
