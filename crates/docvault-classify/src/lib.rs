//! Document Classification for DocVault
//!
//! Derives a category and one-sentence summary from extracted text by calling
//! an external chat-completion service. Classification is an enrichment, not a
//! correctness-critical step: the [`Classifier`] trait is a total function
//! that absorbs every failure internally and falls back to the defaults in
//! `docvault-core`.

pub mod classifier;
pub mod parse;

// Re-exports
pub use classifier::{Classifier, FixedClassifier, InferenceClassifier};
pub use parse::parse_analysis;

/// Internal error type for the inference call.
///
/// Never crosses the [`Classifier`] boundary; used only to decide when to
/// fall back to the default classification.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Service returned status {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

pub(crate) type InferenceResult<T> = std::result::Result<T, InferenceError>;
