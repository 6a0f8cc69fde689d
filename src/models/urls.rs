use crate::config::{PathStyle, RegistryConfig};
use crate::error::{DirectError, Result};
use crate::models::identifier::ModelIdentifier;

/// Registry API version segment
const API_VERSION: &str = "v2";

/// Pure URL and path-hint construction for a registry
///
/// Callers must pass an already validated [`ModelIdentifier`]; nothing here
/// touches the network or the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryUrls {
    registry_base: String,
    registry_host: String,
    page_base: String,
    models_root: String,
    path_style: PathStyle,
}

impl RegistryUrls {
    /// Build from config, checking the registry URL has a host
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let parsed = reqwest::Url::parse(&config.url)
            .map_err(|e| DirectError::Config(format!("Invalid registry URL {}: {e}", config.url)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| DirectError::Config(format!("Registry URL {} has no host", config.url)))?;
        // Local installs name the folder after host:port when the port is explicit
        let registry_host = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            registry_base: config.url.trim_end_matches('/').to_string(),
            registry_host,
            page_base: config.page_url.trim_end_matches('/').to_string(),
            models_root: config.models_root.clone(),
            path_style: config.path_style,
        })
    }

    /// Host used in local manifest folders, e.g. `registry.ollama.ai` or `127.0.0.1:8080`
    #[must_use]
    pub fn registry_host(&self) -> &str {
        &self.registry_host
    }

    /// `<registry>/v2/<namespace>/<model>/`
    #[must_use]
    pub fn base_url(&self, id: &ModelIdentifier) -> String {
        format!("{}/{API_VERSION}/{}/", self.registry_base, id.path())
    }

    #[must_use]
    pub fn manifest_url(&self, id: &ModelIdentifier) -> String {
        format!("{}manifests/{}", self.base_url(id), id.tag)
    }

    /// Blob download URL; `digest` is `sha256:<hex>`
    #[must_use]
    pub fn blob_url(&self, id: &ModelIdentifier, digest: &str) -> String {
        format!("{}blobs/{digest}", self.base_url(id))
    }

    /// Human-facing model page
    #[must_use]
    pub fn model_page_url(&self, id: &ModelIdentifier) -> String {
        format!("{}/{}/{}", self.page_base, id.namespace, id.model)
    }

    /// Where a local install keeps this model's manifests (informational only)
    #[must_use]
    pub fn manifest_folder_hint(&self, id: &ModelIdentifier) -> String {
        self.join_path(&[
            &self.models_root,
            "manifests",
            &self.registry_host,
            &id.namespace,
            &id.model,
        ])
    }

    /// The manifest file itself is named after the tag
    #[must_use]
    pub fn manifest_file_hint(&self, id: &ModelIdentifier) -> String {
        self.join_path(&[&self.manifest_folder_hint(id), &id.tag])
    }

    #[must_use]
    pub fn blobs_folder_hint(&self) -> String {
        self.join_path(&[&self.models_root, "blobs"])
    }

    fn join_path(&self, parts: &[&str]) -> String {
        parts.join(&self.path_style.separator().to_string())
    }
}

/// On-disk blob name for a digest: `sha256:<hex>` becomes `sha256-<hex>`
#[must_use]
pub fn digest_to_filename(digest: &str) -> String {
    digest.replacen(':', "-", 1)
}
