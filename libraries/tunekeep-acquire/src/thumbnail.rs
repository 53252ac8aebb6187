//! Cover image download

use crate::error::{AcquireError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use tunekeep_core::CoverArt;

/// MIME type assumed when the server does not send one
pub const DEFAULT_MIME: &str = "image/jpeg";

#[async_trait]
pub trait ThumbnailSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<CoverArt>;
}

/// Fetches thumbnails over HTTP
#[derive(Debug, Clone)]
pub struct HttpThumbnails {
    http: Client,
}

impl HttpThumbnails {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AcquireError::Thumbnail(e.to_string()))?;
        Ok(Self { http })
    }

    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ThumbnailSource for HttpThumbnails {
    async fn fetch(&self, url: &str) -> Result<CoverArt> {
        debug!(url = %url, "Fetching thumbnail");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AcquireError::Thumbnail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquireError::Thumbnail(format!("HTTP {status} for {url}")));
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_MIME)
            .to_string();

        let data = response
            .bytes()
            .await
            .map_err(|e| AcquireError::Thumbnail(e.to_string()))?;

        Ok(CoverArt {
            data: data.to_vec(),
            mime_type,
        })
    }
}
