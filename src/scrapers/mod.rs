//! Content fetching: turn an article URL into markdown text.
//!
//! Fetching follows a two-source pattern:
//!
//! 1. **Remote browser**: render the page, locate the first `<article>`
//!    region and convert it to markdown
//! 2. **Fallback reader**: when the page has no article region (or it is
//!    empty once converted), ask the reader API for the page text instead
//!
//! # Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`browser`] | Remote browser service and sessions |
//! | [`fallback`] | Reader API used when no article region is found |
//! | [`markdown`] | HTML to markdown conversion |
//!
//! The browser session is always closed once navigation has been attempted,
//! whether it succeeded, found nothing, or failed. [`get_content_as_markdown`]
//! never fails: any fetch error is logged and yields an empty string.

pub mod browser;
pub mod fallback;
pub mod markdown;

use crate::error::{Result, TrustLensError};
use browser::{BrowserService, BrowserSession};
use fallback::FallbackReader;
use markdown::html_to_markdown;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use url::Url;

/// Parse and check a submitted article URL.
///
/// Only absolute `http`/`https` URLs with a host are accepted.
///
/// # Errors
///
/// Returns [`TrustLensError::InvalidInput`] for anything else.
pub fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| TrustLensError::InvalidInput(format!("{:?} is not a valid URL: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TrustLensError::InvalidInput(format!(
            "unsupported URL scheme: {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(TrustLensError::InvalidInput(format!("URL has no host: {}", raw)));
    }
    Ok(url)
}

/// Fetch the article text, propagating fetch errors.
///
/// # Returns
///
/// The article region as markdown, or the fallback reader's raw text when
/// the rendered page has no usable article region.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn try_get_content<B, F>(browser: &B, fallback: &F, url: &Url) -> Result<String>
where
    B: BrowserService,
    F: FallbackReader,
{
    let mut session = browser.connect().await?;
    let rendered = read_article(&mut session, url).await;
    if let Err(e) = session.close().await {
        warn!(error = %e, "Failed to close browser session");
    }

    match rendered? {
        Some(markdown) => {
            info!(chars = markdown.len(), "Extracted article region");
            Ok(markdown)
        }
        None => {
            info!("No article region found; using fallback reader");
            fallback.read(url).await
        }
    }
}

async fn read_article<S: BrowserSession>(session: &mut S, url: &Url) -> Result<Option<String>> {
    session.goto(url).await?;
    Ok(session
        .article_html()
        .map(|html| html_to_markdown(&html))
        .filter(|markdown| !markdown.is_empty()))
}

/// Fetch the article text, degrading to an empty string on any failure.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn get_content_as_markdown<B, F>(browser: &B, fallback: &F, url: &Url) -> String
where
    B: BrowserService,
    F: FallbackReader,
{
    let t0 = Instant::now();
    match try_get_content(browser, fallback, url).await {
        Ok(content) => {
            info!(
                chars = content.len(),
                elapsed_ms = t0.elapsed().as_millis(),
                "Fetched content"
            );
            content
        }
        Err(e) => {
            error!(error = %e, elapsed_ms = t0.elapsed().as_millis(), "Content fetch failed");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBrowser, FakeFallback};

    fn url() -> Url {
        Url::parse("https://example.com/a1").unwrap()
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a1").is_ok());
        assert!(validate_url("  http://example.com  ").is_ok());
        assert!(matches!(
            validate_url("not a url"),
            Err(TrustLensError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_url("ftp://example.com/file"),
            Err(TrustLensError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_url("mailto:editor@example.com"),
            Err(TrustLensError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_article_region_is_converted() {
        let browser = FakeBrowser::with_page(
            "<html><body><article><h1>Headline</h1><p>Body text.</p></article></body></html>",
        );
        let fallback = FakeFallback::ok("Fallback body");

        let content = get_content_as_markdown(&browser, &fallback, &url()).await;
        assert_eq!(content, "# Headline\n\nBody text.");
        assert_eq!(fallback.calls(), 0);
        assert_eq!(browser.closes(), 1);
    }

    #[tokio::test]
    async fn test_missing_article_uses_fallback() {
        let browser = FakeBrowser::with_page("<html><body><div>Teaser</div></body></html>");
        let fallback = FakeFallback::ok("Fallback body");

        let content = get_content_as_markdown(&browser, &fallback, &url()).await;
        assert_eq!(content, "Fallback body");
        assert_eq!(fallback.calls(), 1);
        assert_eq!(browser.closes(), 1);
    }

    #[tokio::test]
    async fn test_empty_article_uses_fallback() {
        let browser = FakeBrowser::with_page("<article>  <script>track()</script> </article>");
        let fallback = FakeFallback::ok("Fallback body");

        let content = get_content_as_markdown(&browser, &fallback, &url()).await;
        assert_eq!(content, "Fallback body");
    }

    #[tokio::test]
    async fn test_navigation_failure_still_closes_session() {
        let browser = FakeBrowser::failing_navigation();
        let fallback = FakeFallback::ok("Fallback body");

        let content = get_content_as_markdown(&browser, &fallback, &url()).await;
        assert_eq!(content, "");
        assert_eq!(browser.closes(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_browser_degrades_to_empty() {
        let browser = FakeBrowser::unreachable();
        let fallback = FakeFallback::ok("Fallback body");

        let err = try_get_content(&browser, &fallback, &url()).await.unwrap_err();
        assert!(matches!(err, TrustLensError::Fetch(_)));
        assert_eq!(get_content_as_markdown(&browser, &fallback, &url()).await, "");
        assert_eq!(browser.closes(), 0);
    }

    #[tokio::test]
    async fn test_fallback_error_degrades_to_empty() {
        let browser = FakeBrowser::with_page("<p>No article</p>");
        let fallback = FakeFallback::failing();

        let content = get_content_as_markdown(&browser, &fallback, &url()).await;
        assert_eq!(content, "");
        assert_eq!(browser.closes(), 1);
    }
}
