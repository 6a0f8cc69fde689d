use thiserror::Error;

/// Main error type for ollama-direct
#[derive(Error, Debug)]
pub enum DirectError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Relay(#[from] RelayError),

    #[error("Config error: {0}\n\nTroubleshooting:\n- Check config file: ~/.config/ollama-direct/config.toml\n- Remove the file to fall back to built-in defaults\n- Run with RUST_LOG=debug for more details")]
    Config(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("Server error: {0}\n\nTroubleshooting:\n- Is another process bound to the same address?\n- Change [server].addr in config or pass --addr")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Rejections produced while parsing a model identifier.
///
/// These never reach the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Model name is required")]
    Empty,

    #[error("Model name is required after '{0}'")]
    MissingAfterPrefix(String),

    #[error("Use the format \"model:tag\", \"model:latest\" if unsure, or \"ollama pull/run model[:tag]\"")]
    TagFormat,

    #[error("User namespace must be in format \"namespace/model\"")]
    NamespaceFormat,

    #[error("{0} cannot be empty")]
    EmptyPart(&'static str),

    #[error("{0} can only contain letters, numbers, _, -, and .")]
    InvalidChars(&'static str),
}

/// How an outbound request failed before any HTTP status was received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Network,
    Timeout,
    Connection,
}

/// Failures of the manifest relay
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// Bad inbound request (never sent upstream)
    #[error("{0}")]
    InvalidRequest(String),

    /// DNS, connect, or timeout failure
    #[error("Transport error ({kind:?}): {message}")]
    Transport { kind: TransportKind, message: String },

    /// Non-2xx answer from the registry
    #[error("Failed to fetch data: {status_text}{}", detail_suffix(.detail))]
    Upstream {
        status: u16,
        status_text: String,
        detail: String,
    },

    /// 2xx answer whose body is not JSON
    #[error("Invalid response format: {0}")]
    Format(String),
}

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(" - {detail}")
    }
}

pub type Result<T> = std::result::Result<T, DirectError>;
