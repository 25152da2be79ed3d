//! The analysis pipeline for one submitted URL.
//!
//! # Steps
//!
//! | Step | Stage | On failure |
//! |------|-------|------------|
//! | 0 | Validate the URL | logged, nothing else runs |
//! | 1 | Fetch content as markdown | empty content, analysis skipped |
//! | 2 | Extract article metadata | `article` left unset |
//! | 3 | Run the seven aspect extractors concurrently | aspect degrades to empty |
//! | 4 | Normalize into the analysis result | cannot fail |
//! | 5 | Classify the trust level | `trustLevel` left unset |
//!
//! [`Pipeline::run`] never fails: the worst case is a [`RequestState`] with
//! unset fields. The clients are built once at startup and borrowed here.

use crate::aggregator::aggregate;
use crate::api::AskAsync;
use crate::config::PipelineConfig;
use crate::extractors::extract_article;
use crate::models::RequestState;
use crate::scrapers::browser::BrowserService;
use crate::scrapers::fallback::FallbackReader;
use crate::scrapers::{get_content_as_markdown, validate_url};
use crate::trust::classify_trust;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Orchestrates fetching, extraction, aggregation and classification.
pub struct Pipeline<'a, A, B, F> {
    llm: &'a A,
    browser: &'a B,
    fallback: &'a F,
    config: &'a PipelineConfig,
}

impl<'a, A, B, F> Pipeline<'a, A, B, F>
where
    A: AskAsync,
    B: BrowserService,
    F: FallbackReader,
{
    pub fn new(llm: &'a A, browser: &'a B, fallback: &'a F, config: &'a PipelineConfig) -> Self {
        Self {
            llm,
            browser,
            fallback,
            config,
        }
    }

    /// Analyse one article URL.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn run(&self, url: &str) -> RequestState {
        let t0 = Instant::now();
        let mut state = RequestState::new(url);

        let target = match validate_url(url) {
            Ok(target) => target,
            Err(e) => {
                error!(error = %e, "Rejected URL before fetching");
                return state;
            }
        };

        info!("Step 1: fetching article content");
        let content = get_content_as_markdown(self.browser, self.fallback, &target).await;
        if content.trim().is_empty() && self.config.skip_on_empty_content {
            warn!("No content fetched; skipping analysis");
            return state;
        }

        info!("Step 2: extracting article metadata");
        match extract_article(self.llm, &content).await {
            Ok(article) => state.article = Some(article),
            Err(e) => warn!(error = %e, "Metadata extraction failed; continuing without article"),
        }

        info!("Step 3: running aspect extractors");
        let aggregation = aggregate(self.llm, &content).await;

        info!("Step 4: classifying trust level");
        match classify_trust(self.llm, &aggregation.result, self.config.classifier_max_tokens).await {
            Ok(trust) => state.trust_level = Some(trust),
            Err(e) => error!(error = %e, "Trust classification failed"),
        }

        state.result = Some(aggregation.result);
        state.summaries = aggregation.summaries;

        info!(
            elapsed_ms = t0.elapsed().as_millis(),
            has_article = state.article.is_some(),
            has_trust_level = state.trust_level.is_some(),
            "Analysis done"
        );
        state
    }
}
