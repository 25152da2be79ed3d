//! Remote browser sessions.
//!
//! Pages are rendered by a remote headless-browser service so that
//! script-built articles come back fully laid out. The service is reached
//! through the [browserless](https://www.browserless.io/) REST surface: the
//! configured WebSocket endpoint (`ws://` or `wss://`, usually carrying a
//! `?token=`) is mapped onto its HTTP twin, `/json/version` is used as the
//! connection probe, and `/content` renders a page after network idle and
//! returns its HTML.
//!
//! [`BrowserService`] and [`BrowserSession`] are the seams the content
//! fetcher is written against, so tests can drive it with in-memory fakes.

use crate::config::BrowserConfig;
use crate::error::{Result, TrustLensError};
use crate::utils::truncate_for_log;
use scraper::{Html, Selector};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// A remote browser that can open rendering sessions.
pub trait BrowserService {
    type Session: BrowserSession;

    /// Open a session. Fails with [`TrustLensError::Fetch`] when the service
    /// is unreachable or does not answer within the connect timeout.
    async fn connect(&self) -> Result<Self::Session>;
}

/// One open browser session.
pub trait BrowserSession {
    /// Navigate to `url` and wait until the network is idle.
    async fn goto(&mut self, url: &Url) -> Result<()>;

    /// Outer HTML of the first article region of the rendered page, if any.
    fn article_html(&self) -> Option<String>;

    /// Release the session.
    async fn close(&mut self) -> Result<()>;
}

/// Browser service backed by a browserless deployment.
#[derive(Debug, Clone)]
pub struct BrowserlessService {
    http: reqwest::Client,
    base: Url,
    connect_timeout: Duration,
}

impl BrowserlessService {
    /// Build the service from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrustLensError::Config`] if no endpoint is configured or the
    /// endpoint cannot be parsed.
    pub fn new(config: &BrowserConfig) -> Result<Self> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            TrustLensError::Config("missing browser endpoint (BROWSERLESS_WS_ENDPOINT)".to_string())
        })?;
        let base = http_endpoint(endpoint)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.navigation_timeout_secs))
            .build()
            .map_err(|e| TrustLensError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        })
    }

    /// HTTP URL for a REST path, keeping the endpoint's query (the token).
    pub fn endpoint_for(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url
    }
}

/// Map a browser WebSocket endpoint onto its HTTP equivalent.
pub fn http_endpoint(endpoint: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint)
        .map_err(|e| TrustLensError::Config(format!("invalid browser endpoint: {}", e)))?;

    let scheme = match url.scheme() {
        "ws" | "http" => "http",
        "wss" | "https" => "https",
        other => {
            return Err(TrustLensError::Config(format!(
                "unsupported browser endpoint scheme: {}",
                other
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| TrustLensError::Config(format!("cannot use {} endpoint", scheme)))?;
    Ok(url)
}

impl BrowserService for BrowserlessService {
    type Session = BrowserlessSession;

    #[instrument(level = "info", skip_all)]
    async fn connect(&self) -> Result<BrowserlessSession> {
        let probe = self.endpoint_for("/json/version");
        let response = self
            .http
            .get(probe)
            .timeout(self.connect_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TrustLensError::Fetch(format!(
                        "browser connect timed out after {}s",
                        self.connect_timeout.as_secs()
                    ))
                } else {
                    TrustLensError::Fetch(format!("browser unreachable: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(TrustLensError::Fetch(format!(
                "browser connect failed with status {}",
                response.status()
            )));
        }

        info!(host = self.base.host_str().unwrap_or("-"), "Connected to remote browser");
        Ok(BrowserlessSession {
            http: self.http.clone(),
            content_url: self.endpoint_for("/content"),
            html: None,
        })
    }
}

/// A rendering session against browserless' `/content` endpoint.
#[derive(Debug)]
pub struct BrowserlessSession {
    http: reqwest::Client,
    content_url: Url,
    html: Option<String>,
}

impl BrowserSession for BrowserlessSession {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn goto(&mut self, url: &Url) -> Result<()> {
        let body = json!({
            "url": url.as_str(),
            "gotoOptions": { "waitUntil": "networkidle0" },
        });

        let response = self
            .http
            .post(self.content_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| TrustLensError::Fetch(format!("navigation failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TrustLensError::Fetch(format!("failed to read rendered page: {}", e)))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), body = %truncate_for_log(&text, 200), "Browser navigation failed");
            return Err(TrustLensError::Fetch(format!(
                "navigation failed with status {}",
                status
            )));
        }

        debug!(bytes = text.len(), "Rendered page received");
        self.html = Some(text);
        Ok(())
    }

    fn article_html(&self) -> Option<String> {
        self.html.as_deref().and_then(find_article_html)
    }

    async fn close(&mut self) -> Result<()> {
        self.html = None;
        debug!("Browser session released");
        Ok(())
    }
}

/// Outer HTML of the first `<article>` element in a page.
pub fn find_article_html(html: &str) -> Option<String> {
    let selector = Selector::parse("article").ok()?;
    let document = Html::parse_document(html);
    document.select(&selector).next().map(|article| article.html())
}
