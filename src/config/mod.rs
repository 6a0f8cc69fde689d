//! Configuration module for ollama-direct
//!
//! Loads config from `$XDG_CONFIG_HOME/ollama-direct/config.toml` or `~/.config/ollama-direct/config.toml`.
//! Falls back to embedded defaults if file doesn't exist.
//! Partial configs are merged with defaults using serde's default attributes.
//!
//! # Example
//!
//! ```no_run
//! use ollama_direct::config::Config;
//!
//! let config = Config::load().expect("Failed to load config");
//! println!("Registry: {}", config.registry.url);
//! println!("Timeout: {:?}", config.relay.timeout_secs);
//! ```

pub mod schema;

use crate::error::{DirectError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub use schema::{Config, PathStyle, RegistryConfig, RelayConfig, ServerConfig, TelemetryConfig};

impl Config {
    /// Load from the default location, or defaults if no file exists
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path; the file must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DirectError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| DirectError::Config(format!("Failed to parse {}: {e}", path.display())))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("registry.url", &self.registry.url),
            ("registry.page_url", &self.registry.page_url),
        ] {
            let parsed = reqwest::Url::parse(value)
                .map_err(|e| DirectError::Config(format!("{field} is not a valid URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(DirectError::Config(format!(
                    "{field} must be an http(s) URL with a host, got {value}"
                )));
            }
        }

        if !matches!(self.telemetry.backend.as_str(), "none" | "file") {
            return Err(DirectError::Config(format!(
                "Unknown telemetry backend: {}. Must be 'none' or 'file'",
                self.telemetry.backend
            )));
        }

        Ok(())
    }
}

/// Get config file path
pub fn config_path() -> Result<PathBuf> {
    let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config)
    } else {
        dirs::config_dir()
            .ok_or_else(|| DirectError::Config("Could not determine config directory".to_string()))?
    };

    Ok(config_dir.join("ollama-direct/config.toml"))
}

/// Get data directory used by file telemetry
pub fn data_dir() -> Result<PathBuf> {
    let data_dir = if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data)
    } else {
        dirs::data_dir()
            .ok_or_else(|| DirectError::Config("Could not determine data directory".to_string()))?
    };

    Ok(data_dir.join("ollama-direct"))
}
