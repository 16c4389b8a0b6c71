//! Document text extractors
//!
//! One extractor per recognized format, dispatched through a registry.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::debug;

use crate::format::DocumentFormat;
use crate::{ExtractError, Result};

/// Trait for document text extractors
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract plain text from raw document bytes
    async fn extract(&self, content: &[u8]) -> Result<String>;

    /// The format this extractor handles
    fn format(&self) -> DocumentFormat;

    /// Get extractor name
    fn name(&self) -> &'static str;
}

/// Fixed-layout (PDF) extractor
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, content: &[u8]) -> Result<String> {
        let document = lopdf::Document::load_mem(content)
            .map_err(|e| ExtractError::Malformed(format!("Unreadable PDF: {}", e)))?;

        let pages: Vec<u32> = document.get_pages().keys().copied().collect();
        let text = document
            .extract_text(&pages)
            .map_err(|e| ExtractError::Malformed(format!("PDF text extraction failed: {}", e)))?;

        debug!(
            pages = pages.len(),
            chars = text.len(),
            "Extracted PDF text"
        );

        Ok(text)
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

/// Zipped-XML (DOCX) extractor
///
/// Reads `word/document.xml` out of the archive and collects the text nodes,
/// inserting a newline at each paragraph end.
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        Self
    }

    fn document_xml(content: &[u8]) -> Result<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(content))
            .map_err(|e| ExtractError::Malformed(format!("Unreadable DOCX archive: {}", e)))?;

        let mut entry = archive
            .by_name("word/document.xml")
            .map_err(|e| ExtractError::Malformed(format!("Missing word/document.xml: {}", e)))?;

        let mut xml = String::new();
        entry
            .read_to_string(&mut xml)
            .map_err(|e| ExtractError::Malformed(format!("Unreadable document stream: {}", e)))?;

        Ok(xml)
    }

    fn text_from_xml(xml: &str) -> Result<String> {
        let mut reader = Reader::from_str(xml);
        let mut text = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Text(t)) => {
                    let fragment = t
                        .unescape()
                        .map_err(|e| ExtractError::Malformed(format!("Invalid XML text: {}", e)))?;
                    text.push_str(&fragment);
                }
                Ok(Event::End(e)) if e.name().as_ref() == b"w:p" => text.push('\n'),
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(ExtractError::Malformed(format!(
                        "Malformed document XML: {}",
                        e
                    )))
                }
            }
        }

        Ok(text)
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for DocxExtractor {
    async fn extract(&self, content: &[u8]) -> Result<String> {
        let xml = Self::document_xml(content)?;
        let text = Self::text_from_xml(&xml)?;

        debug!(chars = text.len(), "Extracted DOCX text");

        Ok(text)
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn name(&self) -> &'static str {
        "docx"
    }
}

/// Registry dispatching uploads to the extractor for their declared format
pub struct ExtractorRegistry {
    extractors: HashMap<DocumentFormat, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Registry with all built-in extractors
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfExtractor::new()));
        registry.register(Arc::new(DocxExtractor::new()));
        registry
    }

    pub fn register(&mut self, extractor: Arc<dyn TextExtractor>) {
        self.extractors.insert(extractor.format(), extractor);
    }

    pub fn get(&self, format: DocumentFormat) -> Option<Arc<dyn TextExtractor>> {
        self.extractors.get(&format).cloned()
    }

    /// Resolve the format from the declared filename and extract text.
    ///
    /// Unsupported extensions fail before the bytes are touched.
    pub async fn extract(&self, filename: &str, content: &[u8]) -> Result<String> {
        let format = DocumentFormat::from_filename(filename)?;
        let extractor = self
            .get(format)
            .ok_or_else(|| ExtractError::UnsupportedFormat(filename.to_string()))?;

        debug!(filename = %filename, extractor = %extractor.name(), "Extracting text");

        extractor.extract(content).await
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
