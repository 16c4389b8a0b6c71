//! Text Extraction for DocVault
//!
//! Converts uploaded document bytes into plain text. Exactly two formats are
//! recognized: PDF and DOCX. Everything else is rejected before any other
//! pipeline step runs, so no bytes are ever archived for content the system
//! cannot process.

pub mod extractors;
pub mod format;

// Re-exports
pub use extractors::{DocxExtractor, ExtractorRegistry, PdfExtractor, TextExtractor};
pub use format::DocumentFormat;

/// Error types for extraction operations
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failed: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
