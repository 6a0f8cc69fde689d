#![allow(dead_code)]

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use ollama_direct::config::{PathStyle, RegistryConfig, RelayConfig};
use ollama_direct::lookup::Resolver;
use ollama_direct::models::RegistryUrls;
use ollama_direct::relay::Relay;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};

pub fn sample_manifest() -> Value {
    json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
        "config": {
            "mediaType": "application/vnd.docker.container.image.v1+json",
            "digest": "sha256:cfg0",
            "size": 487
        },
        "layers": [
            {
                "mediaType": "application/vnd.ollama.image.model",
                "digest": "sha256:model0",
                "size": 1_629_509_152u64
            },
            {
                "mediaType": "application/vnd.ollama.image.params",
                "digest": "sha256:params0",
                "size": 65
            }
        ]
    })
}

async fn manifest(Path((namespace, model, tag)): Path<(String, String, String)>) -> Response {
    match (namespace.as_str(), model.as_str(), tag.as_str()) {
        ("library", "gemma2", "2b") => Json(sample_manifest()).into_response(),
        ("library", "garbage", _) => (StatusCode::OK, "<html>not json</html>").into_response(),
        ("library", "limited", _) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"message": "slow down"})),
        )
            .into_response(),
        ("library", "broken", _) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
        }
        ("library", "forbidden", _) => (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "denied"})),
        )
            .into_response(),
        ("library", "slow", _) => {
            sleep(Duration::from_secs(5)).await;
            Json(sample_manifest()).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"errors": [{"code": "MANIFEST_UNKNOWN", "message": "manifest unknown"}]})),
        )
            .into_response(),
    }
}

/// Start a fake registry on an ephemeral port and return its base URL
pub async fn spawn_registry() -> String {
    let app = Router::new().route("/v2/:namespace/:model/manifests/:tag", get(manifest));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock registry");
    let addr = listener.local_addr().expect("No local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{addr}")
}

/// An address nothing is listening on
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    listener.local_addr().expect("No local addr")
}

pub fn relay(timeout_secs: u64) -> Relay {
    Relay::new(&RelayConfig {
        timeout_secs: Some(timeout_secs),
    })
    .expect("Failed to build relay")
}

/// Relay with the client's default timeout
pub fn relay_without_timeout() -> Relay {
    Relay::new(&RelayConfig::default()).expect("Failed to build relay")
}

pub fn resolver(registry: &str) -> Resolver {
    let urls = RegistryUrls::from_config(&RegistryConfig {
        url: registry.to_string(),
        path_style: PathStyle::Unix,
        ..RegistryConfig::default()
    })
    .expect("Invalid registry config");
    Resolver::new(urls, relay(5))
}
