//! Error taxonomy for the analysis pipeline.
//!
//! Every stage of a request maps its failures onto one of these variants.
//! Most of them never reach the caller: the pipeline logs them and degrades
//! the affected part of the [`RequestState`](crate::models::RequestState)
//! to an empty or absent field instead.

use thiserror::Error;

/// Errors raised while fetching, extracting, or classifying an article.
#[derive(Debug, Error)]
pub enum TrustLensError {
    /// The submitted URL is malformed or uses an unsupported scheme.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The remote browser or the fallback reader failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// An LLM call or its schema validation failed for metadata or an aspect.
    #[error("Extraction error in {stage}: {message}")]
    Extraction { stage: String, message: String },

    /// The trust-level classification call failed.
    #[error("Classification error: {0}")]
    Classification(String),

    /// Missing or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TrustLensError {
    pub fn extraction(stage: impl Into<String>, message: impl ToString) -> Self {
        TrustLensError::Extraction {
            stage: stage.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, TrustLensError>;
