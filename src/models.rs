//! Data models for an article analysis request.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: Normalized article metadata extracted by the LLM
//! - [`Issue`] / [`AspectResult`]: Raw per-aspect extraction output
//! - [`AspectOutcome`]: Whether an aspect was extracted or degraded to empty
//! - [`ResultItem`] / [`AnalysisResult`]: The uniform, normalized result set
//! - [`TrustResult`]: The overall trust verdict
//! - [`RequestState`]: Everything produced for one submitted URL
//!
//! Field names on the wire follow the JSON the LLM is asked to produce
//! (`sourceUrl`, `trustLevel`) and the result shape the report consumes
//! (`Title`, `Source`, `SourceUrl`, `Description`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the seven journalistic-integrity dimensions.
///
/// The variant names double as the keys of the serialized [`AnalysisResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Aspect {
    TruthAndAccuracy,
    Independence,
    FairnessAndImpartiality,
    Accountability,
    HarmMinimization,
    Attribution,
    OriginalReporting,
}

impl Aspect {
    /// All aspects, in report order.
    pub const ALL: [Aspect; 7] = [
        Aspect::TruthAndAccuracy,
        Aspect::Independence,
        Aspect::FairnessAndImpartiality,
        Aspect::Accountability,
        Aspect::HarmMinimization,
        Aspect::Attribution,
        Aspect::OriginalReporting,
    ];

    /// The key used in the serialized result set.
    pub fn key(&self) -> &'static str {
        match self {
            Aspect::TruthAndAccuracy => "TruthAndAccuracy",
            Aspect::Independence => "Independence",
            Aspect::FairnessAndImpartiality => "FairnessAndImpartiality",
            Aspect::Accountability => "Accountability",
            Aspect::HarmMinimization => "HarmMinimization",
            Aspect::Attribution => "Attribution",
            Aspect::OriginalReporting => "OriginalReporting",
        }
    }

    /// Human-readable section title.
    pub fn display_name(&self) -> &'static str {
        match self {
            Aspect::TruthAndAccuracy => "Truth and Accuracy",
            Aspect::Independence => "Independence",
            Aspect::FairnessAndImpartiality => "Fairness and Impartiality",
            Aspect::Accountability => "Accountability",
            Aspect::HarmMinimization => "Harm Minimization",
            Aspect::Attribution => "Attribution",
            Aspect::OriginalReporting => "Original Reporting",
        }
    }

    /// Typical one-line conclusion for this aspect.
    ///
    /// Used as the example in the conclusion field description sent to the
    /// LLM, and as the section summary when an extractor gives none.
    pub fn default_summary(&self) -> &'static str {
        match self {
            Aspect::TruthAndAccuracy => {
                "The main claims are supported but require additional verification"
            }
            Aspect::Independence => "No obvious conflicts of interest detected",
            Aspect::FairnessAndImpartiality => "Multiple viewpoints are presented",
            Aspect::Accountability => "Sources are cited but some need additional verification",
            Aspect::HarmMinimization => "Content appears to follow ethical guidelines",
            Aspect::Attribution => "Most claims are properly attributed to sources",
            Aspect::OriginalReporting => "Some content appears to be derivative of other sources",
        }
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Article metadata as extracted by the LLM from the fetched text.
///
/// Produced once per request and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// The title of the news article.
    pub title: String,
    /// The URL of the news article.
    pub url: String,
    /// The body of the news article.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// The author of the news article.
    #[serde(default)]
    pub author: Option<String>,
    /// The date the news article was published.
    #[serde(default)]
    pub date: Option<String>,
}

/// A single flagged instance within an aspect (e.g. one unattributed claim).
///
/// All seven aspects share this shape. Only the claims aspect fills
/// `claim`; `source` and `sourceUrl` may be absent in any of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub title: String,
    /// The claim statement itself (claims aspect only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    pub description: String,
}

/// Issues found for one aspect, plus the extractor's overall conclusion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AspectResult {
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub conclusion: Option<String>,
}

/// What an aspect extractor handed to the aggregator.
///
/// Keeps "zero issues found" distinguishable from "extraction failed".
#[derive(Debug, Clone, PartialEq)]
pub enum AspectOutcome {
    Extracted(AspectResult),
    Degraded { reason: String },
}

impl AspectOutcome {
    pub fn issues(&self) -> &[Issue] {
        match self {
            AspectOutcome::Extracted(result) => &result.issues,
            AspectOutcome::Degraded { .. } => &[],
        }
    }

    pub fn conclusion(&self) -> Option<&str> {
        match self {
            AspectOutcome::Extracted(result) => result.conclusion.as_deref(),
            AspectOutcome::Degraded { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, AspectOutcome::Degraded { .. })
    }
}

/// One normalized row of the result set. Absent optional fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultItem {
    pub title: String,
    pub source: String,
    pub source_url: String,
    pub description: String,
}

/// The combined, normalized result set keyed by aspect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult(BTreeMap<Aspect, Vec<ResultItem>>);

impl AnalysisResult {
    pub fn new(items: BTreeMap<Aspect, Vec<ResultItem>>) -> Self {
        Self(items)
    }

    /// Items for an aspect; empty when the aspect is missing.
    pub fn get(&self, aspect: Aspect) -> &[ResultItem] {
        self.0.get(&aspect).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True once every one of the seven aspects has an entry.
    pub fn is_complete(&self) -> bool {
        Aspect::ALL.iter().all(|aspect| self.0.contains_key(aspect))
    }

    pub fn total_items(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Coarse overall verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrustLevel {
    High,
    Medium,
    Low,
    Unknown,
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrustLevel::High => "High",
            TrustLevel::Medium => "Medium",
            TrustLevel::Low => "Low",
            TrustLevel::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Trust verdict with the model's short rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustResult {
    pub trust_level: TrustLevel,
    #[serde(default)]
    pub trust_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectStatus {
    Extracted,
    Degraded,
}

/// Per-aspect status and conclusion, kept alongside the normalized items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectSummary {
    pub aspect: Aspect,
    pub status: AspectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
}

/// The full lifecycle object for one submitted URL.
///
/// Created when the request starts, filled in step by step, handed to the
/// output layer, then dropped. Any stage that fails leaves its field unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestState {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(rename = "trustLevel", default, skip_serializing_if = "Option::is_none")]
    pub trust_level: Option<TrustResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summaries: Vec<AspectSummary>,
}

impl RequestState {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            article: None,
            result: None,
            trust_level: None,
            summaries: Vec::new(),
        }
    }

    pub fn summary_for(&self, aspect: Aspect) -> Option<&AspectSummary> {
        self.summaries.iter().find(|s| s.aspect == aspect)
    }
}
