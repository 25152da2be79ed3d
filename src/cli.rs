//! Command-line interface definitions for Trust Lens.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Service credentials and endpoints can be provided via command-line flags or
//! environment variables; values given here override the optional YAML config.

use crate::outputs::markdown::SortKey;
use clap::Parser;

/// Command-line arguments for the Trust Lens application.
///
/// # Examples
///
/// ```sh
/// # Analyse an article and print the JSON result
/// trust_lens -u https://example.com/news/story
///
/// # Write JSON and a Markdown report, keeping only rows mentioning "reuters"
/// trust_lens -u https://example.com/news/story -j ./out/story.json -m ./out/story.md --filter reuters
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// URL of the news article to analyse
    #[arg(short, long)]
    pub url: String,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "TRUST_LENS_CONFIG")]
    pub config: Option<String>,

    /// Write the request state as JSON to this file (stdout when omitted)
    #[arg(short, long)]
    pub json_output: Option<String>,

    /// Write a Markdown report to this file
    #[arg(short, long)]
    pub markdown_output: Option<String>,

    /// Only show report rows whose title or source contains this text
    #[arg(long)]
    pub filter: Option<String>,

    /// Sort report rows
    #[arg(long, value_enum)]
    pub sort: Option<SortKey>,

    /// Azure OpenAI endpoint, e.g. https://my-resource.openai.azure.com
    #[arg(long, env = "AZURE_OPENAI_ENDPOINT")]
    pub azure_openai_endpoint: Option<String>,

    /// Azure OpenAI API key
    #[arg(long, env = "AZURE_OPENAI_KEY", hide_env_values = true)]
    pub azure_openai_key: Option<String>,

    /// Azure OpenAI API version
    #[arg(long, env = "AZURE_OPENAI_API_VERSION")]
    pub azure_openai_api_version: Option<String>,

    /// Azure OpenAI deployment name
    #[arg(long, env = "AZURE_OPENAI_DEPLOYMENT")]
    pub azure_openai_deployment: Option<String>,

    /// Remote browser endpoint (ws://, wss://, http:// or https://, may carry ?token=)
    #[arg(long, env = "BROWSERLESS_WS_ENDPOINT", hide_env_values = true)]
    pub browser_endpoint: Option<String>,

    /// Base URL of the fallback reader service
    #[arg(long, env = "FALLBACK_READER_URL")]
    pub fallback_base_url: Option<String>,
}
