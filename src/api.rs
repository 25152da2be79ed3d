//! LLM API interaction for structured extraction.
//!
//! This module provides the interface every extractor and the trust
//! classifier use to talk to the hosted chat model. A request is always a
//! fixed system instruction, one human turn, and a declared output schema;
//! the response is a JSON object conforming to that schema.
//!
//! # Architecture
//!
//! The module uses a trait-based design for flexibility:
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`AzureChatClient`]: Azure OpenAI chat-completions over `reqwest`
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//! - [`ask_structured`]: Sends a request and deserializes the structured reply
//!
//! One client is built at process start and shared by reference with every
//! extractor, so the seven concurrent aspect calls reuse one connection pool.
//!
//! # Retry Strategy
//!
//! Retries are off by default (`max_retries = 0`). When enabled:
//! - Exponential backoff starting at the configured base delay
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use crate::config::LlmConfig;
use crate::error::TrustLensError;
use crate::schema::OutputSchema;
use crate::utils::{looks_truncated, truncate_for_log};
use rand::{Rng, rng};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

/// Errors raised while calling the LLM service.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    #[error("Failed to parse LLM response: {0}")]
    Parse(String),

    #[error("LLM returned no content")]
    EmptyResponse,
}

/// One structured chat request.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    /// Fixed system instruction.
    pub system: &'a str,
    /// The single human turn (article text or a serialized result).
    pub human: &'a str,
    /// The shape the reply must conform to.
    pub schema: &'a OutputSchema,
    pub max_tokens: Option<u32>,
}

/// Trait for async LLM interaction.
///
/// Implementors send a [`ChatRequest`] to an LLM and return the raw JSON text
/// of its structured reply. This abstraction allows for different LLM
/// backends or decorators (like retry logic), and for scripted fakes in tests.
pub trait AskAsync {
    /// Send the request and receive the model's JSON reply.
    ///
    /// # Arguments
    ///
    /// * `request` - System instruction, human turn, and output schema
    ///
    /// # Returns
    ///
    /// The reply content as a JSON string, or an error if the request failed.
    async fn ask(&self, request: &ChatRequest<'_>) -> Result<String, LlmError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying LLM client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    ///
    /// # Arguments
    ///
    /// * `inner` - The underlying LLM client to wrap
    /// * `max_retries` - Maximum number of retry attempts (0 disables retries)
    /// * `base_delay` - Initial delay between retries
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = AzureChatClient::new(&config.llm)?;
    /// let retry_client = RetryAsk::new(client, 2, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    /// Backoff before retry `attempt` (1-based), without jitter.
    fn backoff_delay(&self, attempt: usize) -> StdDuration {
        let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    #[instrument(level = "debug", skip_all, fields(schema = %request.schema.name))]
    async fn ask(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(request).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        if self.max_retries > 0 {
                            error!(
                                attempt,
                                max = self.max_retries,
                                elapsed_ms_attempt = attempt_dt.as_millis(),
                                elapsed_ms_total = total_dt.as_millis(),
                                error = %e,
                                "ask() exhausted retries"
                            );
                        }
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.backoff_delay(attempt) + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseChoice {
    message: ChatResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatResponseChoice>,
}

/// Azure OpenAI chat-completions client with structured output.
///
/// Built once from [`LlmConfig`] at startup. The underlying `reqwest::Client`
/// carries a request timeout so a hung completion cannot stall a request forever.
#[derive(Debug, Clone)]
pub struct AzureChatClient {
    http: reqwest::Client,
    endpoint: String,
    deployment: String,
    api_version: String,
    api_key: String,
    temperature: f32,
}

impl AzureChatClient {
    /// Build the client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TrustLensError::Config`] if the endpoint, key, or API version
    /// is missing, or if the HTTP client cannot be constructed.
    pub fn new(config: &LlmConfig) -> Result<Self, TrustLensError> {
        let missing = |name: &str| TrustLensError::Config(format!("missing LLM setting: {}", name));
        let endpoint = config.endpoint.clone().ok_or_else(|| missing("endpoint"))?;
        let api_key = config.api_key.clone().ok_or_else(|| missing("api_key"))?;
        let api_version = config
            .api_version
            .clone()
            .ok_or_else(|| missing("api_version"))?;

        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| TrustLensError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            deployment: config.deployment.clone(),
            api_version,
            api_key,
            temperature: config.temperature,
        })
    }

    /// Chat-completions URL for the configured deployment.
    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }

    /// JSON body for a structured chat request.
    pub fn request_body(&self, request: &ChatRequest<'_>) -> Value {
        let mut body = json!({
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.human },
            ],
            "temperature": self.temperature,
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema.name,
                    "schema": request.schema.schema,
                    "strict": false,
                },
            },
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

/// Pull the first choice's content out of a chat-completions response body.
pub fn extract_content(response_text: &str) -> Result<String, LlmError> {
    let response: ChatResponse =
        serde_json::from_str(response_text).map_err(|e| LlmError::Parse(e.to_string()))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;

    if choice.finish_reason.as_deref() == Some("length") {
        warn!("Completion stopped at the token limit; reply may be truncated");
    }

    match choice.message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(LlmError::EmptyResponse),
    }
}

impl AskAsync for AzureChatClient {
    #[instrument(level = "info", skip_all, fields(schema = %request.schema.name))]
    async fn ask(&self, request: &ChatRequest<'_>) -> Result<String, LlmError> {
        let t0 = Instant::now();
        debug!(
            deployment = %self.deployment,
            prompt_chars = request.human.len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(elapsed_ms = t0.elapsed().as_millis(), "LLM request timed out");
                } else if e.is_connect() {
                    warn!("Connection error - check network connectivity");
                }
                LlmError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error message".to_string());
            warn!(
                status = status.as_u16(),
                body = %truncate_for_log(&message, 300),
                "LLM API returned an error"
            );
            return Err(LlmError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;
        let content = extract_content(&response_text)?;

        debug!(
            elapsed_ms = t0.elapsed().as_millis(),
            content_chars = content.len(),
            "Chat completion received"
        );
        Ok(content)
    }
}

/// Ask for a structured reply and deserialize it into `T`.
///
/// This is the primary entry point used by the extractors and the classifier.
///
/// # Arguments
///
/// * `client` - Any [`AskAsync`] implementation
/// * `system` - The fixed system instruction
/// * `human` - The human turn
/// * `schema` - The declared output schema
/// * `max_tokens` - Optional completion token cap
///
/// # Returns
///
/// The deserialized reply, or [`LlmError::Parse`] when the reply does not fit `T`.
#[instrument(level = "debug", skip_all, fields(schema = %schema.name))]
pub async fn ask_structured<A, T>(
    client: &A,
    system: &str,
    human: &str,
    schema: &OutputSchema,
    max_tokens: Option<u32>,
) -> Result<T, LlmError>
where
    A: AskAsync,
    T: DeserializeOwned,
{
    let request = ChatRequest {
        system,
        human,
        schema,
        max_tokens,
    };
    let raw = client.ask(&request).await?;

    serde_json::from_str::<T>(&raw).map_err(|e| {
        if looks_truncated(&e) {
            warn!(error = %e, "Structured reply ended early (truncated JSON)");
        } else {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&raw, 300),
                "Model returned non-conforming JSON"
            );
        }
        LlmError::Parse(e.to_string())
    })
}
