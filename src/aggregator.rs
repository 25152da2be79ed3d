//! Result aggregation across the seven aspects.
//!
//! All seven aspect extractors run concurrently against the same article
//! text and are joined with an all-complete barrier. Since every extractor
//! absorbs its own failures, the join always yields seven outcomes, which
//! are then normalized into the uniform [`ResultItem`] shape:
//!
//! | ResultItem | Issue |
//! |------------|-------|
//! | `Title` | `title` |
//! | `Source` | `source`, or `""` |
//! | `SourceUrl` | `sourceUrl`, or `""` |
//! | `Description` | `description` |

use crate::api::AskAsync;
use crate::extractors::aspects::spec_for;
use crate::extractors::extract_aspect;
use crate::models::{
    AnalysisResult, Aspect, AspectOutcome, AspectStatus, AspectSummary, Issue, ResultItem,
};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, instrument};

/// The normalized result set plus per-aspect status.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub result: AnalysisResult,
    pub summaries: Vec<AspectSummary>,
}

/// Run every aspect extractor concurrently and wait for all of them.
#[instrument(level = "info", skip_all)]
pub async fn run_aspect_extractors<A: AskAsync>(
    client: &A,
    text: &str,
) -> Vec<(Aspect, AspectOutcome)> {
    let t0 = Instant::now();
    let outcomes = join_all(Aspect::ALL.iter().map(|aspect| async move {
        (*aspect, extract_aspect(client, spec_for(*aspect), text).await)
    }))
    .await;

    let degraded = outcomes.iter().filter(|(_, o)| o.is_degraded()).count();
    info!(
        aspects = outcomes.len(),
        degraded,
        elapsed_ms = t0.elapsed().as_millis(),
        "All aspect extractors settled"
    );
    outcomes
}

/// Map one issue onto the uniform row shape.
pub fn normalize_issue(issue: &Issue) -> ResultItem {
    ResultItem {
        title: issue.title.clone(),
        source: issue.source.clone().unwrap_or_default(),
        source_url: issue.source_url.clone().unwrap_or_default(),
        description: issue.description.clone(),
    }
}

/// Build the result set. Every aspect gets an entry, empty when it was
/// degraded or missing from `outcomes`.
pub fn normalize_outcomes(outcomes: &[(Aspect, AspectOutcome)]) -> AnalysisResult {
    let mut items: BTreeMap<Aspect, Vec<ResultItem>> =
        Aspect::ALL.iter().map(|aspect| (*aspect, Vec::new())).collect();

    for (aspect, outcome) in outcomes {
        items
            .entry(*aspect)
            .or_default()
            .extend(outcome.issues().iter().map(normalize_issue));
    }
    AnalysisResult::new(items)
}

pub fn summarize(outcomes: &[(Aspect, AspectOutcome)]) -> Vec<AspectSummary> {
    outcomes
        .iter()
        .map(|(aspect, outcome)| AspectSummary {
            aspect: *aspect,
            status: if outcome.is_degraded() {
                AspectStatus::Degraded
            } else {
                AspectStatus::Extracted
            },
            conclusion: outcome.conclusion().map(str::to_string),
        })
        .collect()
}

/// Extract all aspects and assemble the normalized result.
pub async fn aggregate<A: AskAsync>(client: &A, text: &str) -> Aggregation {
    let outcomes = run_aspect_extractors(client, text).await;
    let result = normalize_outcomes(&outcomes);
    info!(items = result.total_items(), "Aggregated analysis result");
    Aggregation {
        result,
        summaries: summarize(&outcomes),
    }
}
