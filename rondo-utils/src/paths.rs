//! Path utilities for rondo
//!
//! XDG base directories for config, state and runtime files.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Application identifier for XDG directories
const APP_NAME: &str = "rondo";

/// Socket file name inside the runtime directory
const SOCKET_NAME: &str = "rondo.sock";

/// Get the Unix socket path for client-server communication
///
/// Location: `$XDG_RUNTIME_DIR/rondo/rondo.sock` or `/tmp/rondo-$UID/rondo.sock`
pub fn socket_path() -> PathBuf {
    runtime_dir().join(SOCKET_NAME)
}

/// Get the runtime directory
///
/// Location: `$XDG_RUNTIME_DIR/rondo` or `/tmp/rondo-$UID`
pub fn runtime_dir() -> PathBuf {
    match std::env::var_os("XDG_RUNTIME_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join(APP_NAME),
        _ => {
            // SAFETY: getuid() cannot fail and touches no memory
            let uid = unsafe { libc::getuid() };
            std::env::temp_dir().join(format!("{}-{}", APP_NAME, uid))
        }
    }
}

/// Resolve one of the project directories, falling back under `$HOME`
fn project_dir(pick: impl FnOnce(&ProjectDirs) -> Option<&Path>, fallback: &[&str]) -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .and_then(|dirs| pick(&dirs).map(Path::to_path_buf))
        .unwrap_or_else(|| {
            let home = std::env::var_os("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir);
            fallback.iter().fold(home, |path, part| path.join(part)).join(APP_NAME)
        })
}

/// Get the configuration directory
///
/// Location: `$XDG_CONFIG_HOME/rondo` or `~/.config/rondo`
pub fn config_dir() -> PathBuf {
    project_dir(|dirs| Some(dirs.config_dir()), &[".config"])
}

/// Get the main configuration file path
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the state directory
///
/// Location: `$XDG_STATE_HOME/rondo` or `~/.local/state/rondo`
pub fn state_dir() -> PathBuf {
    project_dir(ProjectDirs::state_dir, &[".local", "state"])
}

/// Get the log directory
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}
