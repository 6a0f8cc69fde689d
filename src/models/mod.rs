pub mod identifier;
pub mod manifest;
pub mod urls;

pub use identifier::ModelIdentifier;
pub use manifest::{format_bytes, Download, Layer, Manifest, MediaType};
pub use urls::{digest_to_filename, RegistryUrls};
