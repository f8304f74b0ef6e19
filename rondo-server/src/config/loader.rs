//! Configuration loader

use std::path::Path;

use rondo_utils::{config_file, Result, RondoError};

use super::AppConfig;

/// Widest status line accepted
const MAX_STATUS_WIDTH: usize = 1024;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default location
    pub fn load() -> Result<AppConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| RondoError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| RondoError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(config: &AppConfig) -> Result<()> {
        if config.status.width == 0 || config.status.width > MAX_STATUS_WIDTH {
            return Err(RondoError::config(format!(
                "status width must be between 1 and {}",
                MAX_STATUS_WIDTH
            )));
        }

        if config.general.base_index > i32::MAX as u32 {
            return Err(RondoError::config("base_index is too large"));
        }

        Ok(())
    }

    /// Load and validate
    pub fn load_and_validate() -> Result<AppConfig> {
        let config = Self::load()?;
        Self::validate(&config)?;
        Ok(config)
    }
}
