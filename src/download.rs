//! Remote image downloads
//!
//! A single bounded attempt: the request is capped by the configured timeout,
//! the body by the configured size, and a non-2xx status aborts the operation.

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use futures_util::stream::StreamExt;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// HTTP client for fetching source images
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: Client,
    max_bytes: u64,
}

impl ImageDownloader {
    /// Create a downloader from the shared configuration
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new(config: &EditorConfig) -> Result<Self> {
        Self::with_limits(config.network_timeout, config.max_download_bytes)
    }

    /// # Errors
    /// - Failed to create HTTP client
    pub fn with_limits(timeout: Duration, max_bytes: u64) -> Result<Self> {
        let client = build_client(timeout)?;
        Ok(Self { client, max_bytes })
    }

    /// Download the full body of `url`
    ///
    /// # Errors
    /// - `EditorError::Network` on connect, timeout or body read failures
    /// - `EditorError::RemoteFetch` on a non-2xx status
    /// - `EditorError::PayloadTooLarge` once the body passes the cap
    pub async fn download(&self, url: &Url) -> Result<Vec<u8>> {
        log::info!("Downloading image from: {}", url);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| EditorError::network(format!("Failed to download {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EditorError::RemoteFetch {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(EditorError::PayloadTooLarge {
                    received: length,
                    limit: self.max_bytes,
                });
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk
                .map_err(|e| EditorError::network(format!("Failed to read response body: {}", e)))?;
            bytes.extend_from_slice(&chunk);

            if bytes.len() as u64 > self.max_bytes {
                return Err(EditorError::PayloadTooLarge {
                    received: bytes.len() as u64,
                    limit: self.max_bytes,
                });
            }
        }

        log::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

/// Every client in the crate shares one timeout policy
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("imgedit/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| EditorError::network(format!("Failed to create HTTP client: {}", e)))
}
