pub mod classify;
pub mod envelope;

use crate::config::RelayConfig;
use crate::error::{DirectError, RelayError, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

pub use envelope::ErrorEnvelope;

/// Message for a missing or non-string inbound `url`
pub const URL_REQUIRED_MESSAGE: &str = "URL is required and must be a string";

/// Message for an inbound `url` that is not http(s)
pub const URL_SCHEME_MESSAGE: &str = "URL must use http or https";

/// Single-shot manifest fetcher
///
/// Every call issues exactly one GET and never retries.
#[derive(Debug, Clone)]
pub struct Relay {
    client: reqwest::Client,
    /// Unset leaves reqwest's default (no timeout)
    timeout: Option<Duration>,
}

impl Relay {
    /// Create relay from config
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DirectError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout: config.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Fetch `url` and return its JSON body unchanged
    pub async fn fetch_manifest(&self, url: &str) -> std::result::Result<Value, RelayError> {
        check_url(url)?;

        tracing::info!("Fetching URL: {url}");

        let mut request = self.client.get(url);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(|e| transport_error(&e))?;

        let status = response.status();
        tracing::info!("Response status: {status}");

        if !status.is_success() {
            return Err(upstream_error(status, response.text().await));
        }

        let text = response.text().await.map_err(|e| transport_error(&e))?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Response is not valid JSON: {e}");
            RelayError::Format(format!("Expected JSON but received non-JSON data ({e})"))
        })
    }
}

/// Reject empty or non-http(s) URLs before anything goes out
pub fn check_url(url: &str) -> std::result::Result<(), RelayError> {
    if url.trim().is_empty() {
        return Err(RelayError::InvalidRequest(URL_REQUIRED_MESSAGE.to_string()));
    }

    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(RelayError::InvalidRequest(URL_SCHEME_MESSAGE.to_string())),
    }
}

fn upstream_error(
    status: StatusCode,
    body: std::result::Result<String, reqwest::Error>,
) -> RelayError {
    let status_text = status.canonical_reason().unwrap_or("Unknown Status").to_string();

    // Unreadable, non-JSON or non-object bodies fall back to the status text
    let detail = body
        .ok()
        .and_then(|text| {
            serde_json::from_str::<Value>(&text)
                .ok()
                .filter(Value::is_object)
                .map(|json| classify::extract_error_detail(&json, &text))
        })
        .unwrap_or_else(|| status_text.clone());

    RelayError::Upstream {
        status: status.as_u16(),
        status_text,
        detail,
    }
}

fn transport_error(err: &reqwest::Error) -> RelayError {
    // The top-level message embeds the request URL, so classify on causes only
    let causes = source_chain(err);
    let kind = classify::transport_kind(err.is_timeout(), err.is_connect(), &causes);
    tracing::error!("Error fetching external API: {err}");

    let message = if causes.is_empty() {
        err.to_string()
    } else {
        causes
    };
    RelayError::Transport { kind, message }
}

/// Messages of the sources below `err`, skipping any already quoted by its parent
fn source_chain(err: &dyn std::error::Error) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !parts.last().is_some_and(|last| last.contains(&text)) {
            parts.push(text);
        }
        source = inner.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_url() {
        assert!(check_url("https://registry.ollama.ai/v2/library/gemma2/manifests/2b").is_ok());
        assert!(check_url("http://127.0.0.1:5000/v2/a/b/manifests/c").is_ok());
        assert_eq!(
            check_url(""),
            Err(RelayError::InvalidRequest(URL_REQUIRED_MESSAGE.to_string()))
        );
        assert_eq!(
            check_url("ftp://example.com/file"),
            Err(RelayError::InvalidRequest(URL_SCHEME_MESSAGE.to_string()))
        );
        assert_eq!(
            check_url("not a url"),
            Err(RelayError::InvalidRequest(URL_SCHEME_MESSAGE.to_string()))
        );
    }

    #[test]
    fn test_upstream_error_json_body() {
        let body = r#"{"errors":[{"code":"MANIFEST_UNKNOWN","message":"manifest unknown"}]}"#;
        let err = upstream_error(StatusCode::NOT_FOUND, Ok(body.to_string()));
        assert_eq!(
            err,
            RelayError::Upstream {
                status: 404,
                status_text: "Not Found".to_string(),
                detail: "MANIFEST_UNKNOWN: manifest unknown".to_string(),
            }
        );
    }

    #[test]
    fn test_upstream_error_plain_body_uses_status_text() {
        let err = upstream_error(StatusCode::BAD_GATEWAY, Ok("<html>oops</html>".to_string()));
        assert_eq!(
            err,
            RelayError::Upstream {
                status: 502,
                status_text: "Bad Gateway".to_string(),
                detail: "Bad Gateway".to_string(),
            }
        );
    }

    #[test]
    fn test_upstream_error_non_object_json_uses_status_text() {
        for body in ["null", "42", "\"nope\"", "[1, 2]"] {
            let err = upstream_error(StatusCode::NOT_FOUND, Ok(body.to_string()));
            assert_eq!(
                err,
                RelayError::Upstream {
                    status: 404,
                    status_text: "Not Found".to_string(),
                    detail: "Not Found".to_string(),
                },
                "body {body}"
            );
        }
    }

    /// Error whose message quotes its source, the way hyper and reqwest do
    #[derive(Debug)]
    struct Wrapped {
        label: &'static str,
        inner: Box<dyn std::error::Error + 'static>,
    }

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}: {}", self.label, self.inner)
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(self.inner.as_ref())
        }
    }

    #[test]
    fn test_source_chain_skips_top_level_and_repeats() {
        let refused =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Connection refused");
        let err = Wrapped {
            label: "error sending request for url (http://127.0.0.1:1/v2/library/timeout/manifests/latest)",
            inner: Box::new(Wrapped {
                label: "tcp connect error",
                inner: Box::new(refused),
            }),
        };

        let chain = source_chain(&err);
        assert_eq!(chain, "tcp connect error: Connection refused");
        assert_eq!(
            classify::transport_kind(false, false, &chain),
            crate::error::TransportKind::Connection
        );
    }

    #[test]
    fn test_source_chain_without_sources() {
        let plain = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert_eq!(source_chain(&plain), "");
    }

    #[test]
    fn test_new_relay() {
        let relay = Relay::new(&RelayConfig {
            timeout_secs: Some(7),
        })
        .unwrap();
        assert_eq!(relay.timeout, Some(Duration::from_secs(7)));

        let relay = Relay::new(&RelayConfig::default()).unwrap();
        assert_eq!(relay.timeout, None);
    }
}
