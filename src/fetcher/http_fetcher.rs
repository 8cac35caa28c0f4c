use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::Result;
use crate::domain::{normalize_extension, FetchedImage};
use crate::fetcher::{FetchError, Fetcher};

pub const DEFAULT_USER_AGENT: &str = concat!("magpie/", env!("CARGO_PKG_VERSION"));

/// Largest response body accepted for a single image.
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            timeout,
            max_bytes: MAX_IMAGE_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn download(&self, locator: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let mut response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!("HTTP status {}", status)));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes as u64 {
                return Err(self.too_large());
            }
        }

        // Content-Length may be absent or wrong, so the cap is enforced per chunk.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    fn too_large(&self) -> FetchError {
        FetchError::Transport(format!("response larger than {} bytes", self.max_bytes))
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &str) -> std::result::Result<FetchedImage, FetchError> {
        // Covers connect, headers and body as one attempt.
        let bytes = tokio::time::timeout(self.timeout, self.download(locator))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        Ok(FetchedImage {
            bytes,
            extension: normalize_extension(locator),
        })
    }
}
