//! Trust level classification.
//!
//! The complete [`AnalysisResult`] is serialized to JSON and sent as the
//! human turn of a classification prompt. The model answers with one of the
//! trust tiers plus a short rationale.

use crate::api::{AskAsync, ask_structured};
use crate::error::{Result, TrustLensError};
use crate::models::{AnalysisResult, TrustResult};
use crate::schema::trust_schema;
use std::time::Instant;
use tracing::{debug, info, instrument};

pub const TRUST_PROMPT: &str = "You are an expert classification algorithm of news articles
in a JSON format.

Classify the trust level of the article based on the following levels:
- High: The article is highly trustworthy
- Medium: The article is somewhat trustworthy
- Low: The article is not trustworthy

Motivate your classification with a short description.
Like: \"The article is highly trustworthy because it has a high level of accountability and fairness.\"";

/// Classify an article's trust level from its complete analysis result.
///
/// # Arguments
///
/// * `client` - Any [`AskAsync`] implementation
/// * `result` - The normalized result set; must hold all seven aspects
/// * `max_tokens` - Completion token cap for the short verdict
///
/// # Errors
///
/// Returns [`TrustLensError::Classification`] if the result set is
/// incomplete, or if the call or its schema validation fails.
#[instrument(level = "info", skip_all)]
pub async fn classify_trust<A: AskAsync>(
    client: &A,
    result: &AnalysisResult,
    max_tokens: Option<u32>,
) -> Result<TrustResult> {
    if !result.is_complete() {
        return Err(TrustLensError::Classification(
            "analysis result does not cover every aspect".to_string(),
        ));
    }

    let payload = serde_json::to_string(result)
        .map_err(|e| TrustLensError::Classification(format!("failed to serialize result: {}", e)))?;
    debug!(payload_chars = payload.len(), "Serialized analysis result");

    let t0 = Instant::now();
    let trust: TrustResult = ask_structured(client, TRUST_PROMPT, &payload, &trust_schema(), max_tokens)
        .await
        .map_err(|e| TrustLensError::Classification(e.to_string()))?;

    info!(
        trust_level = %trust.trust_level,
        elapsed_ms = t0.elapsed().as_millis(),
        "Classified trust level"
    );
    Ok(trust)
}
