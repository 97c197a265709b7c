//! Manifest fetcher with retry support.

use crate::types::{DepprobeError, HttpConfig, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Fetches remote manifests.
pub struct ManifestFetcher {
    client: Client,
    config: HttpConfig,
}

impl ManifestFetcher {
    /// Create a new manifest fetcher.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch `url`, retrying transport failures and server errors.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let url = url::Url::parse(url)?;

        let mut retries = 0;
        loop {
            match self.do_fetch(&url).await {
                Ok(body) => {
                    debug!("Fetched manifest: {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    // Client errors (404, 403, ...) won't succeed on retry
                    let should_retry = match e {
                        DepprobeError::HttpError(ref http_err) => http_err
                            .status()
                            .map(|status| !status.is_client_error())
                            .unwrap_or(true),
                        _ => false,
                    };

                    if !should_retry || retries >= self.config.max_retries {
                        if retries > 0 {
                            warn!("Failed to fetch {} after {} retries: {}", url, retries, e);
                        }
                        return Err(e);
                    }

                    retries += 1;
                    trace!("Retry {} for {}", retries, url);
                    tokio::time::sleep(Duration::from_millis(500 * retries as u64)).await;
                }
            }
        }
    }

    async fn do_fetch(&self, url: &url::Url) -> Result<Vec<u8>> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}
