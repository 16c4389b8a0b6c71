//! Document Ingestion Pipeline for DocVault
//!
//! Orchestrates the dependent, independently-failing steps that turn raw
//! uploaded bytes into a persisted, classified record, and the symmetric
//! deletion path that keeps the archive store and the metadata store
//! consistent. All partial-failure policy lives here; the collaborators it
//! drives (extractor registry, classifier, archive store, metadata store)
//! are injected at construction.

pub mod pipeline;

// Re-exports
pub use pipeline::DocumentPipeline;

/// Failure modes of `ingest`, in pipeline order.
///
/// Every variant before `PersistFailed` aborts with no side effect.
/// `PersistFailed` is the one inconsistency window: the object was already
/// archived and stays archived (accepted orphan, no compensating delete).
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Archive write failed: {0}")]
    ArchiveFailed(String),

    #[error("Metadata write failed: {0}")]
    PersistFailed(String),
}

impl IngestError {
    /// Stable machine-readable code for the HTTP layer.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::ExtractionFailed(_) => "extraction_failed",
            Self::ArchiveFailed(_) => "archive_failed",
            Self::PersistFailed(_) => "persist_failed",
        }
    }
}

/// Failure modes of `remove`.
///
/// "No such record" is not among them: that is the `Ok(false)` outcome.
#[derive(Debug, thiserror::Error)]
pub enum RemoveError {
    #[error("Metadata store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Archive delete failed: {0}")]
    ArchiveDeleteFailed(String),

    #[error("Metadata delete failed: {0}")]
    PersistDeleteFailed(String),
}

impl RemoveError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::ArchiveDeleteFailed(_) => "archive_delete_failed",
            Self::PersistDeleteFailed(_) => "persist_delete_failed",
        }
    }
}

/// Failure mode of `list`: a metadata read-path outage.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("Metadata store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ListError {
    pub fn error_code(&self) -> &'static str {
        "store_unavailable"
    }
}
