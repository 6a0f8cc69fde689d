use crate::config::Config;
use crate::error::{RelayError, Result, ValidationError};
use crate::models::{Download, Manifest, ModelIdentifier, RegistryUrls};
use crate::relay::{ErrorEnvelope, Relay};
use crate::telemetry::{self, NoopTelemetry, Telemetry};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Every URL and path hint for one model, computed without network access
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Resolved {
    pub namespace: String,
    pub model: String,
    pub tag: String,
    pub manifest_url: String,
    pub model_page_url: String,
    pub manifest_folder: String,
    pub manifest_file: String,
    pub blobs_folder: String,
}

/// A successful fetch: the resolved URLs plus the relayed manifest
#[derive(Debug, Clone, Serialize)]
pub struct Lookup {
    #[serde(flatten)]
    pub resolved: Resolved,
    /// Registry response, unmodified
    pub manifest: serde_json::Value,
    /// Per-blob download links, empty if the manifest has an unexpected shape
    pub downloads: Vec<Download>,
}

impl Lookup {
    /// Sum of all blob sizes, saturating at `u64::MAX`
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.downloads
            .iter()
            .fold(0u64, |total, download| total.saturating_add(download.size))
    }
}

/// Why a lookup produced no manifest
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Relay(#[from] RelayError),
}

impl LookupError {
    /// Boundary conversion into the shape shown to users
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            Self::Validation(e) => ErrorEnvelope::new(e.to_string(), 400, None),
            Self::Relay(e) => ErrorEnvelope::from(e),
        }
    }
}

/// Parse, build, relay
pub struct Resolver {
    urls: RegistryUrls,
    relay: Relay,
    telemetry: Arc<dyn Telemetry>,
}

impl Resolver {
    #[must_use]
    pub fn new(urls: RegistryUrls, relay: Relay) -> Self {
        Self {
            urls,
            relay,
            telemetry: Arc::new(NoopTelemetry),
        }
    }

    /// Create resolver from config, including its telemetry backend
    pub fn from_config(config: &Config) -> Result<Self> {
        let urls = RegistryUrls::from_config(&config.registry)?;
        let relay = Relay::new(&config.relay)?;
        let telemetry = telemetry::from_config(&config.telemetry)?;
        Ok(Self::new(urls, relay).with_telemetry(telemetry))
    }

    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    #[must_use]
    pub fn telemetry(&self) -> Arc<dyn Telemetry> {
        Arc::clone(&self.telemetry)
    }

    /// URLs for `id`; pure
    #[must_use]
    pub fn resolve_id(&self, id: &ModelIdentifier) -> Resolved {
        Resolved {
            namespace: id.namespace.clone(),
            model: id.model.clone(),
            tag: id.tag.clone(),
            manifest_url: self.urls.manifest_url(id),
            model_page_url: self.urls.model_page_url(id),
            manifest_folder: self.urls.manifest_folder_hint(id),
            manifest_file: self.urls.manifest_file_hint(id),
            blobs_folder: self.urls.blobs_folder_hint(),
        }
    }

    /// Parse `input` and compute its URLs without touching the network
    pub fn resolve(&self, input: &str) -> std::result::Result<Resolved, ValidationError> {
        let id = ModelIdentifier::parse(input)?;
        Ok(self.resolve_id(&id))
    }

    /// Fetch the manifest for an already parsed identifier
    pub async fn fetch_id(
        &self,
        id: &ModelIdentifier,
    ) -> std::result::Result<Lookup, RelayError> {
        let resolved = self.resolve_id(id);
        let manifest = self.relay.fetch_manifest(&resolved.manifest_url).await?;
        let downloads = Manifest::from_value(&manifest)
            .map(|m| m.downloads(&self.urls, id))
            .unwrap_or_default();

        Ok(Lookup {
            resolved,
            manifest,
            downloads,
        })
    }

    /// Parse, record the query, then fetch
    pub async fn fetch(&self, input: &str) -> std::result::Result<Lookup, LookupError> {
        let id = ModelIdentifier::parse(input)?;
        telemetry::record_query(self.telemetry.as_ref(), input.trim()).await;
        Ok(self.fetch_id(&id).await?)
    }
}
