use crate::models::identifier::ModelIdentifier;
use crate::models::urls::{digest_to_filename, RegistryUrls};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media types that appear in Ollama registry manifests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaType {
    ManifestV2,
    ImageConfig,
    Model,
    Adapter,
    Projector,
    Template,
    System,
    Params,
    Messages,
    License,
    Other(String),
}

impl MediaType {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "application/vnd.docker.distribution.manifest.v2+json" => Self::ManifestV2,
            "application/vnd.docker.container.image.v1+json" => Self::ImageConfig,
            "application/vnd.ollama.image.model" => Self::Model,
            "application/vnd.ollama.image.adapter" => Self::Adapter,
            "application/vnd.ollama.image.projector" => Self::Projector,
            "application/vnd.ollama.image.template" => Self::Template,
            "application/vnd.ollama.image.system" => Self::System,
            "application/vnd.ollama.image.params" => Self::Params,
            "application/vnd.ollama.image.messages" => Self::Messages,
            "application/vnd.ollama.image.license" => Self::License,
            other => Self::Other(other.to_string()),
        }
    }

    /// Short label for tables
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::ManifestV2 => "manifest",
            Self::ImageConfig => "config",
            Self::Model => "model",
            Self::Adapter => "adapter",
            Self::Projector => "projector",
            Self::Template => "template",
            Self::System => "system",
            Self::Params => "params",
            Self::Messages => "messages",
            Self::License => "license",
            Self::Other(raw) => raw.rsplit('.').next().unwrap_or(raw),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One content-addressed blob referenced by a manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub media_type: String,
    pub digest: String,
    pub size: u64,
}

impl Layer {
    #[must_use]
    pub fn kind(&self) -> MediaType {
        MediaType::parse(&self.media_type)
    }
}

/// Typed reading of a registry manifest, for presentation only.
///
/// The relay itself passes the JSON through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema_version: u32,
    #[serde(default)]
    pub media_type: Option<String>,
    pub config: Layer,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

/// A single downloadable file derived from a manifest
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Download {
    pub kind: String,
    pub digest: String,
    pub size: u64,
    pub url: String,
    pub filename: String,
}

impl Manifest {
    /// `None` if the document does not have the manifest shape
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value.clone()) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::debug!("Manifest has unexpected shape: {e}");
                None
            }
        }
    }

    /// Config blob first, then layers in manifest order
    #[must_use]
    pub fn downloads(&self, urls: &RegistryUrls, id: &ModelIdentifier) -> Vec<Download> {
        std::iter::once(&self.config)
            .chain(&self.layers)
            .map(|layer| Download {
                kind: layer.kind().label().to_string(),
                digest: layer.digest.clone(),
                size: layer.size,
                url: urls.blob_url(id, &layer.digest),
                filename: digest_to_filename(&layer.digest),
            })
            .collect()
    }
}

/// Format bytes as human-readable string
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
