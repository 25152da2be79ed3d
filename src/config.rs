//! Runtime configuration.
//!
//! Configuration is resolved once at startup: an optional YAML file provides
//! the base values, then command-line flags and environment variables (see
//! [`Cli`]) override them. The resolved [`AppConfig`] is passed by reference
//! to every long-lived client.
//!
//! # Example config.yaml
//!
//! ```yaml
//! llm:
//!   endpoint: https://my-resource.openai.azure.com
//!   api_version: 2024-08-01-preview
//!   deployment: gpt-4o
//!   request_timeout_secs: 90
//! browser:
//!   endpoint: wss://chrome.browserless.io?token=XYZ
//!   connect_timeout_secs: 20
//! fallback:
//!   base_url: https://r.jina.ai
//! pipeline:
//!   skip_on_empty_content: true
//!   classifier_max_tokens: 100
//! ```

use crate::cli::Cli;
use crate::error::{Result, TrustLensError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub browser: BrowserConfig,
    pub fallback: FallbackConfig,
    pub pipeline: PipelineConfig,
}

/// Azure OpenAI chat-completions settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub deployment: String,
    pub temperature: f32,
    /// Upper bound on a single LLM request, including the response body.
    pub request_timeout_secs: u64,
    /// Retry attempts after the first failure. Zero disables retries.
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            api_version: None,
            deployment: "gpt-4o".to_string(),
            temperature: 0.0,
            request_timeout_secs: 120,
            max_retries: 0,
            retry_base_delay_ms: 1000,
        }
    }
}

/// Remote browser service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub endpoint: Option<String>,
    pub connect_timeout_secs: u64,
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            connect_timeout_secs: 20,
            navigation_timeout_secs: 60,
        }
    }
}

/// Fallback reader service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://r.jina.ai".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Pipeline policy knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Stop before any LLM call when the fetched content is empty.
    pub skip_on_empty_content: bool,
    pub classifier_max_tokens: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip_on_empty_content: true,
            classifier_max_tokens: Some(100),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TrustLensError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| TrustLensError::Config(format!("failed to parse config: {}", e)))
    }

    /// Resolve the configuration for this run: file first, then CLI/env overrides.
    #[instrument(level = "info", skip_all)]
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => {
                let config = Self::from_file(Path::new(path))?;
                info!(config_path = %path, "Loaded configuration file");
                config
            }
            None => {
                debug!("No configuration file given; using defaults");
                Self::default()
            }
        };
        config.apply_cli(cli);
        config.llm.validate()?;
        Ok(config)
    }

    /// Overwrite file values with anything given on the command line or in the environment.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(endpoint) = &cli.azure_openai_endpoint {
            self.llm.endpoint = Some(endpoint.clone());
        }
        if let Some(key) = &cli.azure_openai_key {
            self.llm.api_key = Some(key.clone());
        }
        if let Some(version) = &cli.azure_openai_api_version {
            self.llm.api_version = Some(version.clone());
        }
        if let Some(deployment) = &cli.azure_openai_deployment {
            self.llm.deployment = deployment.clone();
        }
        if let Some(endpoint) = &cli.browser_endpoint {
            self.browser.endpoint = Some(endpoint.clone());
        }
        if let Some(base_url) = &cli.fallback_base_url {
            self.fallback.base_url = base_url.clone();
        }
    }
}

impl LlmConfig {
    /// Check that every setting needed to reach the deployment is present.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("endpoint", self.endpoint.is_none()),
            ("api_key", self.api_key.is_none()),
            ("api_version", self.api_version.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TrustLensError::Config(format!(
                "missing LLM settings: {}",
                missing.join(", ")
            )))
        }
    }
}
