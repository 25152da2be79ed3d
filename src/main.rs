//! # Trust Lens
//!
//! A news-article trust analyzer. Given an article URL, it fetches the
//! article through a remote browser (with a reader API as fallback), runs a
//! set of LLM extractors over the text, each evaluating one journalistic
//! principle, and classifies the article's overall trust level.
//!
//! ## Features
//!
//! - Renders pages in a remote headless browser and converts the article
//!   region to markdown
//! - Extracts article metadata and seven aspects concurrently: truth and
//!   accuracy, independence, fairness, accountability, harm minimization,
//!   attribution, original reporting
//! - Degrades per stage: a failed aspect, metadata call or classification
//!   leaves an empty field instead of failing the request
//! - Outputs the request state as JSON and an optional Markdown report
//!
//! ## Usage
//!
//! ```sh
//! trust_lens -u https://example.com/news/story -j ./out/story.json -m ./out/story.md
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: URL to markdown via browser or fallback reader
//! 2. **Metadata**: title, author and date via one structured LLM call
//! 3. **Aspects**: seven structured LLM calls, joined, normalized
//! 4. **Classification**: trust level from the combined result
//! 5. **Output**: JSON (file or stdout) and Markdown report

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod api;
mod cli;
mod config;
mod error;
mod extractors;
mod models;
mod outputs;
mod pipeline;
mod schema;
mod scrapers;
#[cfg(test)]
mod testing;
mod trust;
mod utils;

use api::{AzureChatClient, RetryAsk};
use cli::Cli;
use config::AppConfig;
use outputs::markdown::ReportOptions;
use outputs::{json, markdown};
use pipeline::Pipeline;
use scrapers::browser::BrowserlessService;
use scrapers::fallback::ReaderApi;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("trust_lens starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(url = %args.url, ?args.json_output, ?args.markdown_output, "Parsed CLI arguments");

    // ---- Load config & build long-lived clients ----
    let config = AppConfig::load(&args)?;
    info!(
        deployment = %config.llm.deployment,
        max_retries = config.llm.max_retries,
        "Loaded configuration"
    );

    let llm = RetryAsk::new(
        AzureChatClient::new(&config.llm)?,
        config.llm.max_retries,
        Duration::from_millis(config.llm.retry_base_delay_ms),
    );
    let browser = BrowserlessService::new(&config.browser)?;
    let fallback = ReaderApi::new(&config.fallback)?;

    // ---- Analyse ----
    let state = Pipeline::new(&llm, &browser, &fallback, &config.pipeline)
        .run(&args.url)
        .await;

    // ---- JSON output ----
    match &args.json_output {
        Some(path) => {
            if let Err(e) = json::write_request_state(&state, path).await {
                error!(path = %path, error = %e, "Failed to write JSON");
                return Err(e);
            }
        }
        None => println!("{}", json::request_state_to_json(&state)?),
    }

    // ---- Markdown output ----
    if let Some(path) = &args.markdown_output {
        let options = ReportOptions {
            filter: args.filter.clone(),
            sort: args.sort,
        };
        if let Err(e) = markdown::write_report(&state, &options, path).await {
            error!(path = %path, error = %e, "Failed writing Markdown");
            return Err(e);
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
