use crate::error::{DirectError, RelayError, Result};
use crate::relay::{ErrorEnvelope, Relay, URL_REQUIRED_MESSAGE};
use crate::telemetry::{self, Telemetry};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    relay: Relay,
    telemetry: Arc<dyn Telemetry>,
}

impl AppState {
    #[must_use]
    pub fn new(relay: Relay, telemetry: Arc<dyn Telemetry>) -> Self {
        Self { relay, telemetry }
    }
}

/// Reply of the telemetry endpoints
#[derive(Debug, Serialize)]
struct TelemetryAck {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl TelemetryAck {
    fn from_recorded(recorded: bool) -> Json<Self> {
        Json(Self {
            success: recorded,
            message: (!recorded).then_some("Telemetry error"),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/proxy", post(proxy))
        .route("/api/page-load", post(page_load))
        .route("/api/save-query", post(save_query))
        .with_state(state)
}

/// Bind `addr` and serve until the process stops
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| DirectError::Server(format!("Failed to bind {addr}: {e}")))?;
    serve_on(listener, state).await
}

/// Serve on an already bound listener
pub async fn serve_on(listener: TcpListener, state: AppState) -> Result<()> {
    tracing::info!("Relay listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .await
        .map_err(|e| DirectError::Server(e.to_string()))
}

async fn proxy(State(state): State<AppState>, body: Bytes) -> Response {
    // Accept any body so a missing or non-string url gets the envelope, not a rejection
    let url = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|json| json.get("url").and_then(Value::as_str).map(str::to_string));

    let Some(url) = url else {
        return envelope_response(&ErrorEnvelope::from(RelayError::InvalidRequest(
            URL_REQUIRED_MESSAGE.to_string(),
        )));
    };

    match state.relay.fetch_manifest(&url).await {
        Ok(manifest) => Json(manifest).into_response(),
        Err(e) => envelope_response(&ErrorEnvelope::from(e)),
    }
}

async fn page_load(State(state): State<AppState>) -> Json<TelemetryAck> {
    TelemetryAck::from_recorded(telemetry::record_page_load(state.telemetry.as_ref()).await)
}

async fn save_query(State(state): State<AppState>, body: Bytes) -> Json<TelemetryAck> {
    let query = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|json| json.get("query").and_then(Value::as_str).map(str::to_string));

    let Some(query) = query else {
        return Json(TelemetryAck {
            success: false,
            message: Some("Query is required"),
        });
    };

    TelemetryAck::from_recorded(telemetry::record_query(state.telemetry.as_ref(), &query).await)
}

fn envelope_response(envelope: &ErrorEnvelope) -> Response {
    let status =
        StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}
