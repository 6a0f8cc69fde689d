use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct RegistryConfig {
    /// Registry base, scheme included
    #[serde(default = "default_registry_url")]
    pub url: String,
    /// Base for human-facing model pages
    #[serde(default = "default_page_url")]
    pub page_url: String,
    /// Root shown in local folder hints
    #[serde(default = "default_models_root")]
    pub models_root: String,
    #[serde(default)]
    pub path_style: PathStyle,
}

/// Separator used when rendering local folder hints
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    Windows,
    Unix,
}

impl Default for PathStyle {
    fn default() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }
}

impl PathStyle {
    #[must_use]
    pub const fn separator(self) -> char {
        match self {
            Self::Windows => '\\',
            Self::Unix => '/',
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct RelayConfig {
    /// Per-request timeout; unset keeps the HTTP client's default (none)
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct TelemetryConfig {
    /// "none" or "file"
    #[serde(default = "default_telemetry_backend")]
    pub backend: String,
    pub data_dir: Option<PathBuf>,
}

// Default value functions
fn default_registry_url() -> String {
    "https://registry.ollama.ai".to_string()
}
fn default_page_url() -> String {
    "https://ollama.com".to_string()
}
fn default_models_root() -> String {
    "$OLLAMA_MODELS".to_string()
}
fn default_addr() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_telemetry_backend() -> String {
    "none".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            page_url: default_page_url(),
            models_root: default_models_root(),
            path_style: PathStyle::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            backend: default_telemetry_backend(),
            data_dir: None,
        }
    }
}
