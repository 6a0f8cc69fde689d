mod common;

use common::{relay, sample_manifest, spawn_registry};
use ollama_direct::relay::classify::MANIFEST_UNKNOWN_MESSAGE;
use ollama_direct::relay::{URL_REQUIRED_MESSAGE, URL_SCHEME_MESSAGE};
use ollama_direct::server::{serve_on, AppState};
use ollama_direct::telemetry::{FileTelemetry, NoopTelemetry, Telemetry};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Start the relay server with `telemetry` and return its base URL
async fn spawn_relay(telemetry: Arc<dyn Telemetry>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind relay");
    let addr = listener.local_addr().expect("No local addr");
    let state = AppState::new(relay(5), telemetry);
    tokio::spawn(async move {
        serve_on(listener, state).await.ok();
    });
    format!("http://{addr}")
}

async fn post(url: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .expect("Request failed");
    let status = response.status().as_u16();
    let json = response.json().await.expect("Body is not JSON");
    (status, json)
}

#[tokio::test]
async fn test_proxy_success() {
    let registry = spawn_registry().await;
    let server = spawn_relay(Arc::new(NoopTelemetry)).await;

    let (status, body) = post(
        &format!("{server}/api/proxy"),
        json!({"url": format!("{registry}/v2/library/gemma2/manifests/2b")}),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body, sample_manifest());
}

#[tokio::test]
async fn test_proxy_missing_url() {
    let server = spawn_relay(Arc::new(NoopTelemetry)).await;

    for body in [json!({}), json!({"url": 42}), json!({"url": null})] {
        let (status, envelope) = post(&format!("{server}/api/proxy"), body).await;
        assert_eq!(status, 400);
        assert_eq!(envelope["error"], URL_REQUIRED_MESSAGE);
        assert_eq!(envelope["status"], 400);
        assert!(envelope["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
        assert!(envelope.get("originalMessage").is_none());
    }
}

#[tokio::test]
async fn test_proxy_malformed_body() {
    let server = spawn_relay(Arc::new(NoopTelemetry)).await;

    let response = reqwest::Client::new()
        .post(format!("{server}/api/proxy"))
        .body("not json")
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status().as_u16(), 400);
    let envelope: Value = response.json().await.expect("Body is not JSON");
    assert_eq!(envelope["error"], URL_REQUIRED_MESSAGE);
}

#[tokio::test]
async fn test_proxy_rejects_other_schemes() {
    let server = spawn_relay(Arc::new(NoopTelemetry)).await;

    let (status, envelope) = post(
        &format!("{server}/api/proxy"),
        json!({"url": "file:///etc/passwd"}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(envelope["error"], URL_SCHEME_MESSAGE);
}

#[tokio::test]
async fn test_proxy_upstream_not_found() {
    let registry = spawn_registry().await;
    let server = spawn_relay(Arc::new(NoopTelemetry)).await;

    let (status, envelope) = post(
        &format!("{server}/api/proxy"),
        json!({"url": format!("{registry}/v2/library/nope/manifests/latest")}),
    )
    .await;

    assert_eq!(status, 404);
    assert_eq!(envelope["error"], MANIFEST_UNKNOWN_MESSAGE);
    assert_eq!(envelope["status"], 404);
    assert_eq!(envelope["originalMessage"], "MANIFEST_UNKNOWN: manifest unknown");
}

#[tokio::test]
async fn test_proxy_non_json_upstream() {
    let registry = spawn_registry().await;
    let server = spawn_relay(Arc::new(NoopTelemetry)).await;

    let (status, envelope) = post(
        &format!("{server}/api/proxy"),
        json!({"url": format!("{registry}/v2/library/garbage/manifests/latest")}),
    )
    .await;

    assert_eq!(status, 500);
    assert!(envelope["error"]
        .as_str()
        .is_some_and(|e| e.starts_with("Invalid response format")));
}

#[tokio::test]
async fn test_page_load_and_save_query() {
    let temp_dir = TempDir::new().unwrap();
    let telemetry = Arc::new(FileTelemetry::new(temp_dir.path().to_path_buf()));
    let server = spawn_relay(telemetry.clone()).await;

    let (status, ack) = post(&format!("{server}/api/page-load"), json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(ack, json!({"success": true}));
    post(&format!("{server}/api/page-load"), json!({})).await;
    assert_eq!(telemetry.views().await.unwrap(), 2);

    let (status, ack) = post(
        &format!("{server}/api/save-query"),
        json!({"query": "ollama pull gemma2:2b"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(ack, json!({"success": true}));
    assert_eq!(telemetry.queries().await.unwrap(), vec!["ollama pull gemma2:2b"]);
}

#[tokio::test]
async fn test_save_query_requires_query() {
    let server = spawn_relay(Arc::new(NoopTelemetry)).await;

    let (status, ack) = post(&format!("{server}/api/save-query"), json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(ack, json!({"success": false, "message": "Query is required"}));
}

#[tokio::test]
async fn test_telemetry_failure_is_reported_not_raised() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, "file, not a dir").unwrap();
    let server = spawn_relay(Arc::new(FileTelemetry::new(blocker.join("nested")))).await;

    let (status, ack) = post(&format!("{server}/api/page-load"), json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(ack, json!({"success": false, "message": "Telemetry error"}));
}
