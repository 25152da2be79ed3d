//! The seven aspect extractors, expressed as data.
//!
//! Every aspect is extracted the same way; only the declared output schema
//! differs. Each [`AspectSpec`] carries what varies: the schema name, the
//! name of the issue array in the response, the wording of the field
//! descriptions, and the nullability quirks of the claims aspect.
//!
//! | Aspect | Schema | Array field |
//! |--------|--------|-------------|
//! | Truth and Accuracy | `news-article-claims` | `claims` (nullable) |
//! | Independence | `news-article-conflicts` | `conflicts` |
//! | Fairness and Impartiality | `news-article-fairness` | `fairness` |
//! | Accountability | `news-article-accountability` | `accountabilities` |
//! | Harm Minimization | `news-article-harm-minimization` | `harmMinimizations` |
//! | Attribution | `news-article-attribution` | `attributions` |
//! | Original Reporting | `news-article-original-reporting` | `originalReporting` |

use crate::models::Aspect;

/// Configuration for one aspect extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectSpec {
    pub aspect: Aspect,
    /// Name of the declared output schema.
    pub schema_name: &'static str,
    /// Name of the issue array in the structured response.
    pub field: &'static str,
    /// Singular noun used in the issue field descriptions.
    pub issue_noun: &'static str,
    /// Description of the issue array.
    pub collection_description: &'static str,
    /// What the conclusion is drawn from, e.g. "the claims made".
    pub conclusion_subject: &'static str,
    /// The whole issue array may be null ("nothing found").
    pub nullable_issues: bool,
    /// Issues carry a separate `claim` statement and a nullable `source`.
    pub carries_claim: bool,
}

pub const ASPECTS: [AspectSpec; 7] = [
    AspectSpec {
        aspect: Aspect::TruthAndAccuracy,
        schema_name: "news-article-claims",
        field: "claims",
        issue_noun: "claim",
        collection_description: "The claims made in the article",
        conclusion_subject: "the claims made",
        nullable_issues: true,
        carries_claim: true,
    },
    AspectSpec {
        aspect: Aspect::Independence,
        schema_name: "news-article-conflicts",
        field: "conflicts",
        issue_noun: "conflict",
        collection_description: "The conflicts of interest in the article",
        conclusion_subject: "the conflicts of interest",
        nullable_issues: false,
        carries_claim: false,
    },
    AspectSpec {
        aspect: Aspect::FairnessAndImpartiality,
        schema_name: "news-article-fairness",
        field: "fairness",
        issue_noun: "fairness issue",
        collection_description: "The fairness issues in the article",
        conclusion_subject: "the fairness issues",
        nullable_issues: false,
        carries_claim: false,
    },
    AspectSpec {
        aspect: Aspect::Accountability,
        schema_name: "news-article-accountability",
        field: "accountabilities",
        issue_noun: "accountability issue",
        collection_description: "The accountability issues in the article",
        conclusion_subject: "the accountability issues",
        nullable_issues: false,
        carries_claim: false,
    },
    AspectSpec {
        aspect: Aspect::HarmMinimization,
        schema_name: "news-article-harm-minimization",
        field: "harmMinimizations",
        issue_noun: "harm minimization issue",
        collection_description: "The harm minimization issues in the article",
        conclusion_subject: "the harm minimization issues",
        nullable_issues: false,
        carries_claim: false,
    },
    AspectSpec {
        aspect: Aspect::Attribution,
        schema_name: "news-article-attribution",
        field: "attributions",
        issue_noun: "attribution issue",
        collection_description: "The attribution issues in the article",
        conclusion_subject: "the attribution issues",
        nullable_issues: false,
        carries_claim: false,
    },
    AspectSpec {
        aspect: Aspect::OriginalReporting,
        schema_name: "news-article-original-reporting",
        field: "originalReporting",
        issue_noun: "original reporting issue",
        collection_description: "The original reporting issues in the article",
        conclusion_subject: "the original reporting issues",
        nullable_issues: false,
        carries_claim: false,
    },
];

/// Look up the extractor configuration for an aspect.
pub fn spec_for(aspect: Aspect) -> &'static AspectSpec {
    // ASPECTS is declared in variant order.
    &ASPECTS[aspect as usize]
}

impl AspectSpec {
    /// Description of the conclusion field, with the aspect's typical verdict as example.
    pub fn conclusion_description(&self) -> String {
        format!(
            "Conclusion drawn from {}. An example would be: {}",
            self.conclusion_subject,
            self.aspect.default_summary()
        )
    }
}
