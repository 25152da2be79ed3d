//! Fallback reader API.
//!
//! When the rendered page has no article region, the text is taken from a
//! remote reader service instead: `GET {base}/{url-encoded target}` returns
//! the page as plain markdown.

use crate::config::FallbackConfig;
use crate::error::{Result, TrustLensError};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// A remote service that turns a URL into readable text.
pub trait FallbackReader {
    async fn read(&self, url: &Url) -> Result<String>;
}

/// Reader API client (defaults to `https://r.jina.ai`).
#[derive(Debug, Clone)]
pub struct ReaderApi {
    http: reqwest::Client,
    base_url: String,
}

impl ReaderApi {
    pub fn new(config: &FallbackConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TrustLensError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }
}

/// Reader request URL for a target page.
pub fn reader_url(base_url: &str, target: &Url) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(target.as_str())
    )
}

impl FallbackReader for ReaderApi {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn read(&self, url: &Url) -> Result<String> {
        let request_url = reader_url(&self.base_url, url);
        let response = self
            .http
            .get(&request_url)
            .send()
            .await
            .map_err(|e| TrustLensError::Fetch(format!("fallback reader unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrustLensError::Fetch(format!(
                "fallback reader returned status {}",
                status
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| TrustLensError::Fetch(format!("failed to read fallback body: {}", e)))?;
        info!(bytes = text.len(), "Fetched content from fallback reader");
        Ok(text)
    }
}
