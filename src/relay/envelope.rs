use crate::error::RelayError;
use crate::relay::classify::{
    match_rule, passthrough_or_generic, transport_message, INVALID_FORMAT_MESSAGE,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Failure body returned to callers of the relay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub error: String,
    pub status: u16,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_message: Option<String>,
}

impl ErrorEnvelope {
    #[must_use]
    pub fn new(error: impl Into<String>, status: u16, original_message: Option<String>) -> Self {
        Self {
            error: error.into(),
            status,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            original_message: original_message.filter(|m| !m.is_empty()),
        }
    }

    /// Same envelope with the message marked as a repeated attempt
    #[must_use]
    pub fn as_retry(mut self) -> Self {
        self.error = format!("Retry Attempt: {}", self.error);
        self
    }
}

impl From<&RelayError> for ErrorEnvelope {
    fn from(err: &RelayError) -> Self {
        match err {
            RelayError::InvalidRequest(message) => Self::new(message.clone(), 400, None),
            RelayError::Transport { kind, message } => {
                Self::new(transport_message(*kind), 500, Some(message.clone()))
            }
            RelayError::Upstream {
                status,
                status_text,
                detail,
            } => {
                // Classify on code + text + detail so "Failed to fetch" in the
                // composed message never reads as a network failure
                let probe = format!("{status} {status_text} - {detail}");
                let error = match_rule(&probe)
                    .map_or_else(|| passthrough_or_generic(&err.to_string()), str::to_string);
                Self::new(error, *status, Some(detail.clone()))
            }
            RelayError::Format(message) => {
                Self::new(INVALID_FORMAT_MESSAGE, 500, Some(message.clone()))
            }
        }
    }
}

impl From<RelayError> for ErrorEnvelope {
    fn from(err: RelayError) -> Self {
        Self::from(&err)
    }
}
