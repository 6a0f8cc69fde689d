//! Turning raw failure text into user-facing sentences.
//!
//! Rules are evaluated top to bottom and the first match wins. Predicates
//! overlap (a message can mention both `404` and `timeout`), so the order is
//! part of the behavior.

use crate::error::TransportKind;
use serde_json::Value;

pub const MANIFEST_UNKNOWN_MESSAGE: &str =
    "Model not found: The specified model or tag does not exist in registry";
pub const NOT_FOUND_MESSAGE: &str = "Model not found: The specified model or tag does not exist";
pub const SERVER_ERROR_MESSAGE: &str = "Server error: The Ollama registry is experiencing issues";
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests: Please wait and try again later";
pub const NETWORK_MESSAGE: &str =
    "Network error: Unable to connect to the server. Please check your connection and try again.";
pub const TIMEOUT_MESSAGE: &str =
    "Request timeout: The server took too long to respond. Please try again later.";
pub const CONNECTION_MESSAGE: &str =
    "Connection error: Unable to reach the server. The server may be down or experiencing issues.";
pub const INVALID_FORMAT_MESSAGE: &str =
    "Invalid response format: Expected JSON but received non-JSON data";
pub const GENERIC_MESSAGE: &str = "An error occurred while fetching data from the external API";

/// Messages shorter than this are shown as-is when no rule matches
const PASSTHROUGH_LIMIT: usize = 100;

/// Raw bodies shorter than this are used as error detail
const RAW_DETAIL_LIMIT: usize = 200;

/// Matches when the text contains any of `needles`
#[derive(Debug)]
pub struct Rule {
    pub needles: &'static [&'static str],
    pub message: &'static str,
}

pub const RULES: &[Rule] = &[
    Rule {
        needles: &["MANIFEST_UNKNOWN"],
        message: MANIFEST_UNKNOWN_MESSAGE,
    },
    Rule {
        needles: &["404", "Not Found"],
        message: NOT_FOUND_MESSAGE,
    },
    Rule {
        needles: &["500"],
        message: SERVER_ERROR_MESSAGE,
    },
    Rule {
        needles: &["429", "Too Many Requests"],
        message: RATE_LIMIT_MESSAGE,
    },
    Rule {
        needles: &["Failed to fetch", "NetworkError"],
        message: NETWORK_MESSAGE,
    },
    Rule {
        needles: &["timeout"],
        message: TIMEOUT_MESSAGE,
    },
    Rule {
        needles: &["ENOTFOUND", "ECONNREFUSED"],
        message: CONNECTION_MESSAGE,
    },
    Rule {
        needles: &["Invalid response format"],
        message: INVALID_FORMAT_MESSAGE,
    },
];

impl Rule {
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.needles.iter().any(|needle| text.contains(needle))
    }
}

/// First matching rule's message, if any
#[must_use]
pub fn match_rule(text: &str) -> Option<&'static str> {
    RULES.iter().find(|rule| rule.matches(text)).map(|rule| rule.message)
}

/// Short messages are shown verbatim, long ones replaced
#[must_use]
pub fn passthrough_or_generic(text: &str) -> String {
    if text.chars().count() < PASSTHROUGH_LIMIT {
        text.to_string()
    } else {
        GENERIC_MESSAGE.to_string()
    }
}

/// Pull the most specific error detail out of a registry error body.
///
/// Order: `errors[0]` (`CODE: message`), flat `error`, flat `message`, then the
/// raw body if it is short. Returns an empty string when nothing fits.
#[must_use]
pub fn extract_error_detail(json: &Value, raw: &str) -> String {
    if let Some(first) = json
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let code = non_empty_str(first.get("code"));
        let message = non_empty_str(first.get("message"));
        match (code, message) {
            (Some(code), Some(message)) => return format!("{code}: {message}"),
            (None, Some(message)) => return message.to_string(),
            (Some(code), None) => return format!("Error code: {code}"),
            (None, None) => {}
        }
    }

    if let Some(error) = non_empty_str(json.get("error")) {
        return error.to_string();
    }
    if let Some(message) = non_empty_str(json.get("message")) {
        return message.to_string();
    }

    if raw.chars().count() < RAW_DETAIL_LIMIT {
        raw.to_string()
    } else {
        String::new()
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Decide which transport failure class an error belongs to
///
/// `chain` holds the messages of the error's causes. It must not include the
/// request URL, since model names can contain words like `timeout`.
#[must_use]
pub fn transport_kind(is_timeout: bool, is_connect: bool, chain: &str) -> TransportKind {
    let lower = chain.to_lowercase();
    if is_timeout || lower.contains("timed out") || lower.contains("timeout") {
        TransportKind::Timeout
    } else if is_connect
        || chain.contains("ENOTFOUND")
        || chain.contains("ECONNREFUSED")
        || lower.contains("dns error")
        || lower.contains("failed to lookup address")
        || lower.contains("connection refused")
    {
        TransportKind::Connection
    } else {
        TransportKind::Network
    }
}

/// User-facing sentence for a transport failure class
#[must_use]
pub const fn transport_message(kind: TransportKind) -> &'static str {
    match kind {
        TransportKind::Network => NETWORK_MESSAGE,
        TransportKind::Timeout => TIMEOUT_MESSAGE,
        TransportKind::Connection => CONNECTION_MESSAGE,
    }
}
