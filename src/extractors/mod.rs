//! LLM extractors: article metadata and the seven aspect analyses.
//!
//! Every extractor sends the same article text with a fixed extraction
//! instruction and a declared output schema, then validates the reply
//! against the shape it asked for. Aspect failures never propagate:
//! [`extract_aspect`] returns [`AspectOutcome::Degraded`] and the aggregator
//! carries on with an empty list for that aspect.

pub mod aspects;

use crate::api::{AskAsync, ask_structured};
use crate::error::{Result, TrustLensError};
use crate::models::{Article, AspectOutcome, AspectResult, Issue};
use crate::schema::{OutputSchema, article_schema, aspect_schema};
use aspects::AspectSpec;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// System instruction for the seven aspect extractors.
pub const EXTRACTION_PROMPT: &str = "You are an expert extraction algorithm on markdown text content.\n\
Only extract relevant information from the article.\n\
If you do not know the value of an attribute asked to extract,\n\
return null for the attribute's value";

/// System instruction for article metadata extraction.
pub const ARTICLE_PROMPT: &str = "You are an expert extraction algorithm.\n\
Only extract relevant information from the article.\n\
If you do not know the value of an attribute asked to extract,\n\
return null for the attribute's value";

/// Extract the article's title, URL, body, author, and date.
///
/// # Errors
///
/// Returns [`TrustLensError::Extraction`] with stage `news-article` when the
/// call fails or the reply lacks a title or URL.
#[instrument(level = "info", skip_all)]
pub async fn extract_article<A: AskAsync>(client: &A, text: &str) -> Result<Article> {
    let schema = article_schema();
    let t0 = Instant::now();

    let article: Article = ask_structured(client, ARTICLE_PROMPT, text, &schema, None)
        .await
        .map_err(|e| TrustLensError::extraction(&schema.name, e))?;

    info!(
        title = %article.title,
        author = article.author.as_deref().unwrap_or("-"),
        elapsed_ms = t0.elapsed().as_millis(),
        "Extracted article metadata"
    );
    Ok(article)
}

/// Run one aspect extractor.
///
/// Never fails: any error is logged and turned into a degraded outcome.
#[instrument(level = "info", skip_all, fields(aspect = %spec.aspect))]
pub async fn extract_aspect<A: AskAsync>(
    client: &A,
    spec: &AspectSpec,
    text: &str,
) -> AspectOutcome {
    let schema = aspect_schema(spec);
    let t0 = Instant::now();
    debug!(schema = %schema.name, "Extracting aspect");

    match request_aspect(client, spec, &schema, text).await {
        Ok(result) => {
            info!(
                issues = result.issues.len(),
                has_conclusion = result.conclusion.is_some(),
                elapsed_ms = t0.elapsed().as_millis(),
                "Aspect extracted"
            );
            AspectOutcome::Extracted(result)
        }
        Err(e) => {
            warn!(
                error = %e,
                elapsed_ms = t0.elapsed().as_millis(),
                "Aspect extraction failed; continuing with no items"
            );
            AspectOutcome::Degraded {
                reason: e.to_string(),
            }
        }
    }
}

async fn request_aspect<A: AskAsync>(
    client: &A,
    spec: &AspectSpec,
    schema: &OutputSchema,
    text: &str,
) -> Result<AspectResult> {
    let reply: Value = ask_structured(client, EXTRACTION_PROMPT, text, schema, None)
        .await
        .map_err(|e| TrustLensError::extraction(&schema.name, e))?;
    parse_aspect_response(spec, reply)
}

/// Validate an aspect reply against the shape its schema declares.
///
/// The issue array is required unless the aspect allows it to be null, in
/// which case null or a missing field means "nothing found". The conclusion
/// is optional everywhere.
pub fn parse_aspect_response(spec: &AspectSpec, reply: Value) -> Result<AspectResult> {
    let stage = spec.schema_name;
    let Value::Object(mut object) = reply else {
        return Err(TrustLensError::extraction(stage, "reply is not a JSON object"));
    };

    let issues = match object.remove(spec.field) {
        None | Some(Value::Null) if spec.nullable_issues => Vec::new(),
        None | Some(Value::Null) => {
            return Err(TrustLensError::extraction(
                stage,
                format!("missing field `{}`", spec.field),
            ));
        }
        Some(array @ Value::Array(_)) => serde_json::from_value::<Vec<Issue>>(array)
            .map_err(|e| TrustLensError::extraction(stage, e))?,
        Some(other) => {
            return Err(TrustLensError::extraction(
                stage,
                format!("field `{}` is not an array: {}", spec.field, other),
            ));
        }
    };

    let conclusion = match object.remove("conclusion") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            return Err(TrustLensError::extraction(
                stage,
                format!("field `conclusion` is not a string: {}", other),
            ));
        }
    };

    debug!(aspect = %spec.aspect, issues = issues.len(), "Aspect reply validated");
    Ok(AspectResult { issues, conclusion })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::aspects::spec_for;
    use crate::models::Aspect;
    use crate::testing::ScriptedLlm;
    use serde_json::json;

    #[test]
    fn test_parse_claims_null_is_empty() {
        let spec = spec_for(Aspect::TruthAndAccuracy);
        let result = parse_aspect_response(spec, json!({ "claims": null, "conclusion": null })).unwrap();
        assert!(result.issues.is_empty());
        assert!(result.conclusion.is_none());

        let result = parse_aspect_response(spec, json!({})).unwrap();
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_parse_required_array_missing_is_error() {
        let spec = spec_for(Aspect::Independence);
        let err = parse_aspect_response(spec, json!({ "conclusion": "None found" })).unwrap_err();
        assert!(matches!(err, TrustLensError::Extraction { .. }));
        assert!(err.to_string().contains("conflicts"));
    }

    #[test]
    fn test_parse_conflicts_with_issues() {
        let spec = spec_for(Aspect::Independence);
        let reply = json!({
            "conflicts": [
                {
                    "title": "Sponsor interest",
                    "source": "Acme Corp",
                    "sourceUrl": "https://acme.example/report",
                    "description": "The study was funded by Acme"
                }
            ],
            "conclusion": "One undisclosed funding relationship"
        });

        let result = parse_aspect_response(spec, reply).unwrap();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].source.as_deref(), Some("Acme Corp"));
        assert_eq!(
            result.conclusion.as_deref(),
            Some("One undisclosed funding relationship")
        );
    }

    #[test]
    fn test_parse_rejects_wrong_types() {
        let spec = spec_for(Aspect::Attribution);
        assert!(parse_aspect_response(spec, json!({ "attributions": "none" })).is_err());
        assert!(parse_aspect_response(spec, json!({ "attributions": [], "conclusion": 3 })).is_err());
        assert!(parse_aspect_response(spec, json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_parse_rejects_issue_missing_title() {
        let spec = spec_for(Aspect::Accountability);
        let reply = json!({ "accountabilities": [ { "description": "no title" } ] });
        assert!(parse_aspect_response(spec, reply).is_err());
    }

    #[tokio::test]
    async fn test_extract_aspect_degrades_on_llm_error() {
        let llm = ScriptedLlm::new();
        let outcome = extract_aspect(&llm, spec_for(Aspect::Independence), "text").await;
        assert!(outcome.is_degraded());
        assert!(outcome.issues().is_empty());
    }

    #[tokio::test]
    async fn test_extract_aspect_sends_schema_and_text() {
        let llm = ScriptedLlm::new().reply(
            "news-article-fairness",
            json!({ "fairness": [], "conclusion": "Multiple viewpoints are presented" }),
        );
        let outcome = extract_aspect(&llm, spec_for(Aspect::FairnessAndImpartiality), "# Story").await;

        assert!(!outcome.is_degraded());
        assert_eq!(outcome.conclusion(), Some("Multiple viewpoints are presented"));

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].schema, "news-article-fairness");
        assert_eq!(calls[0].system, EXTRACTION_PROMPT);
        assert_eq!(calls[0].human, "# Story");
    }

    #[tokio::test]
    async fn test_extract_article() {
        let llm = ScriptedLlm::new().reply(
            "news-article",
            json!({
                "title": "City council approves budget",
                "url": "https://example.com/a1",
                "author": null,
                "date": "2024-05-01"
            }),
        );
        let article = extract_article(&llm, "text").await.unwrap();
        assert_eq!(article.title, "City council approves budget");
        assert!(article.author.is_none());
        assert_eq!(article.date.as_deref(), Some("2024-05-01"));
        assert_eq!(llm.calls()[0].system, ARTICLE_PROMPT);
    }

    #[tokio::test]
    async fn test_extract_article_missing_title_is_error() {
        let llm = ScriptedLlm::new().reply("news-article", json!({ "url": "https://example.com/a1" }));
        let err = extract_article(&llm, "text").await.unwrap_err();
        assert!(matches!(err, TrustLensError::Extraction { ref stage, .. } if stage == "news-article"));
    }
}
