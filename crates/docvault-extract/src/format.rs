//! Declared-format resolution
//!
//! The format is taken from the uploaded file's display name, never sniffed
//! from the bytes. Unknown extensions fail fast.

use crate::{ExtractError, Result};

/// Document formats the extractor recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Fixed-layout document (`.pdf`)
    Pdf,
    /// Zipped-XML office document (`.docx`)
    Docx,
}

impl DocumentFormat {
    /// Resolve the format from a declared filename.
    ///
    /// The extension is compared lower-cased, so `INVOICE.PDF` is accepted.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(ExtractError::UnsupportedFormat(filename.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
