pub mod file;

use crate::config::{self, TelemetryConfig};
use crate::error::{DirectError, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub use file::FileTelemetry;

/// Optional usage recording (page views, submitted queries)
///
/// Implementations may fail; callers go through [`record_page_load`] and
/// [`record_query`], which log and drop the error.
#[async_trait]
pub trait Telemetry: Send + Sync {
    async fn record_page_load(&self) -> Result<()>;

    async fn record_query(&self, query: &str) -> Result<()>;

    /// Get backend name for logging/debugging
    fn backend_name(&self) -> &str;
}

/// Telemetry that records nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

#[async_trait]
impl Telemetry for NoopTelemetry {
    async fn record_page_load(&self) -> Result<()> {
        Ok(())
    }

    async fn record_query(&self, _query: &str) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "none"
    }
}

/// Create telemetry backend from config
pub fn from_config(config: &TelemetryConfig) -> Result<Arc<dyn Telemetry>> {
    match config.backend.as_str() {
        "none" => Ok(Arc::new(NoopTelemetry)),
        "file" => {
            let dir = match &config.data_dir {
                Some(dir) => dir.clone(),
                None => config::data_dir()?,
            };
            Ok(Arc::new(FileTelemetry::new(dir)))
        }
        other => Err(DirectError::Config(format!(
            "Unknown telemetry backend: {other}. Must be 'none' or 'file'"
        ))),
    }
}

/// Count a page load, ignoring failures
pub async fn record_page_load(telemetry: &dyn Telemetry) -> bool {
    match telemetry.record_page_load().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("{} telemetry failed to record page load: {e}", telemetry.backend_name());
            false
        }
    }
}

/// Log a query, ignoring failures
pub async fn record_query(telemetry: &dyn Telemetry, query: &str) -> bool {
    match telemetry.record_query(query).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("{} telemetry failed to record query: {e}", telemetry.backend_name());
            false
        }
    }
}
