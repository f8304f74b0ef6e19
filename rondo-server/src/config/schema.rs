//! Configuration schema structs

use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub status: StatusConfig,
    pub startup: StartupConfig,
}

/// General settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// First slot index used for new windows (default: 0)
    pub base_index: u32,
    /// Name for new windows created without one
    pub default_window_name: Option<String>,
}

/// Status line settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Send a status line with every redraw (default: true)
    pub enabled: bool,
    /// Status line width in columns (default: 80)
    pub width: usize,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 80,
        }
    }
}

/// Commands run when the server starts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub commands: Vec<String>,
}
