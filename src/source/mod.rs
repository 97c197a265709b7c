//! Manifest loading from local files or URLs.

pub mod fetcher;

pub use fetcher::ManifestFetcher;

use crate::types::{HttpConfig, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Where the manifest bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    File(PathBuf),
    Url(String),
}

impl ManifestSource {
    /// Read the manifest bytes.
    pub async fn load(&self, http_config: &HttpConfig) -> Result<Vec<u8>> {
        match self {
            ManifestSource::File(path) => {
                debug!("Reading manifest from {}", path.display());
                Ok(tokio::fs::read(path).await?)
            }
            ManifestSource::Url(url) => ManifestFetcher::new(http_config.clone())?.fetch(url).await,
        }
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestSource::File(path) => write!(f, "{}", path.display()),
            ManifestSource::Url(url) => f.write_str(url),
        }
    }
}
