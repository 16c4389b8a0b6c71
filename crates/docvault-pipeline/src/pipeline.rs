//! The ingestion pipeline and document lifecycle API

use std::sync::Arc;
use tracing::{debug, info, warn};

use docvault_classify::Classifier;
use docvault_core::{DocumentId, DocumentRecord, UploadedFile};
use docvault_extract::{ExtractError, ExtractorRegistry};
use docvault_store::{archive_key, ArchiveStore, MetadataStore};

use crate::{IngestError, ListError, RemoveError};

/// Orchestrator for the document lifecycle.
///
/// Per upload: validate format, extract text, archive the original bytes,
/// classify, persist the record - strictly in that order, each step's output
/// feeding the next. Per removal: look up, delete the archived object,
/// delete the record. Requests are independent units of work; the pipeline
/// holds no mutable state of its own.
pub struct DocumentPipeline {
    extractors: Arc<ExtractorRegistry>,
    classifier: Arc<dyn Classifier>,
    archive: Arc<dyn ArchiveStore>,
    metadata: Arc<dyn MetadataStore>,
}

impl DocumentPipeline {
    pub fn new(
        extractors: Arc<ExtractorRegistry>,
        classifier: Arc<dyn Classifier>,
        archive: Arc<dyn ArchiveStore>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            extractors,
            classifier,
            archive,
            metadata,
        }
    }

    /// Ingest one upload into a persisted, classified document record.
    ///
    /// Format rejection and extraction failures abort before anything is
    /// written anywhere. An archive failure likewise leaves no state behind.
    /// A persist failure after a successful archive write is surfaced as
    /// [`IngestError::PersistFailed`] and leaves the archived object in
    /// place; there is no compensating delete.
    pub async fn ingest(&self, upload: UploadedFile) -> Result<DocumentRecord, IngestError> {
        let text = self
            .extractors
            .extract(&upload.name, &upload.bytes)
            .await
            .map_err(|e| match e {
                ExtractError::UnsupportedFormat(name) => IngestError::UnsupportedFormat(name),
                ExtractError::Malformed(reason) => IngestError::ExtractionFailed(reason),
            })?;

        debug!(title = %upload.name, chars = text.len(), "Text extracted");

        let key = archive_key(&upload.name);
        let stored = self
            .archive
            .put(&key, upload.bytes, &upload.content_type)
            .await
            .map_err(|e| IngestError::ArchiveFailed(e.to_string()))?;

        // Infallible by contract: degrades to defaults instead of failing
        let classification = self.classifier.classify(&text).await;

        let record = DocumentRecord::new(upload.name, stored.key, stored.locator, classification);

        if let Err(e) = self.metadata.insert(&record).await {
            warn!(
                archive_key = %record.archive_key,
                title = %record.title,
                error = %e,
                "Metadata write failed after archive write; archived object is orphaned"
            );
            return Err(IngestError::PersistFailed(e.to_string()));
        }

        info!(
            document_id = %record.id,
            title = %record.title,
            category = %record.category,
            "Document ingested"
        );

        Ok(record)
    }

    /// All documents, newest upload first.
    pub async fn list(&self) -> Result<Vec<DocumentRecord>, ListError> {
        self.metadata
            .list()
            .await
            .map_err(|e| ListError::StoreUnavailable(e.to_string()))
    }

    /// Remove a document and its archived bytes.
    ///
    /// Returns `Ok(false)` when no such record exists, with no delete issued
    /// against either store. The archived object is deleted before the
    /// record so a failure between the two leaves metadata pointing at an
    /// absent object for at most one retryable request.
    pub async fn remove(&self, id: DocumentId) -> Result<bool, RemoveError> {
        let record = self
            .metadata
            .find_by_id(id)
            .await
            .map_err(|e| RemoveError::StoreUnavailable(e.to_string()))?;

        let Some(record) = record else {
            debug!(document_id = %id, "Removal requested for unknown document");
            return Ok(false);
        };

        // The key is a first-class field on the record; never re-derived
        // from the locator URL.
        self.archive
            .delete(&record.archive_key)
            .await
            .map_err(|e| RemoveError::ArchiveDeleteFailed(e.to_string()))?;

        let existed = self
            .metadata
            .delete(id)
            .await
            .map_err(|e| RemoveError::PersistDeleteFailed(e.to_string()))?;

        info!(document_id = %id, title = %record.title, "Document removed");

        // The store serializes per key: if the record vanished between
        // lookup and delete, a concurrent removal won and gets the `true`.
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docvault_classify::FixedClassifier;
    use docvault_core::Classification;
    use docvault_store::archive::{self, StoredObject};
    use docvault_store::metadata;
    use docvault_store::{MemoryArchiveStore, MemoryMetadataStore};
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::io::{Cursor, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -- collaborator doubles ------------------------------------------------

    /// Archive store counting calls through to an in-memory store.
    #[derive(Default)]
    struct CountingArchive {
        inner: MemoryArchiveStore,
        puts: AtomicUsize,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl ArchiveStore for CountingArchive {
        async fn put(
            &self,
            key: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> archive::Result<StoredObject> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, bytes, content_type).await
        }

        async fn delete(&self, key: &str) -> archive::Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(key).await
        }
    }

    /// Metadata store counting calls through to an in-memory store.
    #[derive(Default)]
    struct CountingMetadata {
        inner: MemoryMetadataStore,
        inserts: AtomicUsize,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl MetadataStore for CountingMetadata {
        async fn insert(&self, record: &DocumentRecord) -> metadata::Result<()> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.insert(record).await
        }

        async fn find_by_id(&self, id: DocumentId) -> metadata::Result<Option<DocumentRecord>> {
            self.inner.find_by_id(id).await
        }

        async fn list(&self) -> metadata::Result<Vec<DocumentRecord>> {
            self.inner.list().await
        }

        async fn delete(&self, id: DocumentId) -> metadata::Result<bool> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(id).await
        }
    }

    /// Archive store whose writes always fail.
    struct BrokenArchive;

    #[async_trait]
    impl ArchiveStore for BrokenArchive {
        async fn put(
            &self,
            _key: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
        ) -> archive::Result<StoredObject> {
            Err(archive::ArchiveError::Request("storage unavailable".into()))
        }

        async fn delete(&self, _key: &str) -> archive::Result<()> {
            Err(archive::ArchiveError::Request("storage unavailable".into()))
        }
    }

    /// Metadata store whose writes always fail.
    struct BrokenMetadata;

    #[async_trait]
    impl MetadataStore for BrokenMetadata {
        async fn insert(&self, _record: &DocumentRecord) -> metadata::Result<()> {
            Err(metadata::MetadataError::Internal("metadata store offline".into()))
        }

        async fn find_by_id(&self, _id: DocumentId) -> metadata::Result<Option<DocumentRecord>> {
            Err(metadata::MetadataError::Internal("metadata store offline".into()))
        }

        async fn list(&self) -> metadata::Result<Vec<DocumentRecord>> {
            Err(metadata::MetadataError::Internal("metadata store offline".into()))
        }

        async fn delete(&self, _id: DocumentId) -> metadata::Result<bool> {
            Err(metadata::MetadataError::Internal("metadata store offline".into()))
        }
    }

    // -- fixtures ------------------------------------------------------------

    fn sample_pdf(text: &str) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn sample_docx(paragraph: &str) -> Vec<u8> {
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <w:document><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>",
            paragraph
        );

        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::FileOptions::default();
            writer.start_file("word/document.xml", options).unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    struct Harness {
        pipeline: DocumentPipeline,
        archive: Arc<CountingArchive>,
        metadata: Arc<CountingMetadata>,
    }

    fn harness(classification: Classification) -> Harness {
        let archive = Arc::new(CountingArchive::default());
        let metadata = Arc::new(CountingMetadata::default());
        let pipeline = DocumentPipeline::new(
            Arc::new(ExtractorRegistry::with_defaults()),
            Arc::new(FixedClassifier::new(classification)),
            archive.clone(),
            metadata.clone(),
        );
        Harness {
            pipeline,
            archive,
            metadata,
        }
    }

    fn invoice_classification() -> Classification {
        Classification::new("Invoice", "Payment due in 30 days.")
    }

    // -- ingest --------------------------------------------------------------

    #[tokio::test]
    async fn test_ingest_pdf_produces_persisted_record() {
        let h = harness(invoice_classification());
        let upload = UploadedFile::new(
            "invoice.pdf",
            "application/pdf",
            sample_pdf("Invoice #42. Amount due: $1,200."),
        );

        let record = h.pipeline.ingest(upload).await.unwrap();

        assert_eq!(record.title, "invoice.pdf");
        assert!(!record.archive_url.is_empty());
        assert!(record.archive_key.ends_with("-invoice.pdf"));
        assert_eq!(record.category, "Invoice");
        assert_eq!(record.summary, "Payment due in 30 days.");

        // Both stores hold exactly one entry
        assert!(h.archive.inner.contains(&record.archive_key).await);
        assert_eq!(h.metadata.inner.len().await, 1);
    }

    #[tokio::test]
    async fn test_ingest_docx_produces_persisted_record() {
        let h = harness(Classification::new("Report", "Quarterly numbers."));
        let upload = UploadedFile::new(
            "q3.docx",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            sample_docx("Revenue grew 12% in Q3."),
        );

        let record = h.pipeline.ingest(upload).await.unwrap();

        assert_eq!(record.title, "q3.docx");
        assert!(!record.archive_url.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_rejects_unsupported_format_with_no_side_effects() {
        let h = harness(invoice_classification());
        let upload = UploadedFile::new("notes.txt", "text/plain", b"plain text".to_vec());

        let err = h.pipeline.ingest(upload).await.unwrap_err();

        assert!(matches!(err, IngestError::UnsupportedFormat(_)));
        assert_eq!(h.archive.puts.load(Ordering::SeqCst), 0);
        assert_eq!(h.metadata.inserts.load(Ordering::SeqCst), 0);
        assert!(h.pipeline.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_rejects_corrupt_file_with_no_side_effects() {
        let h = harness(invoice_classification());
        let upload = UploadedFile::new(
            "broken.pdf",
            "application/pdf",
            b"this is not a pdf".to_vec(),
        );

        let err = h.pipeline.ingest(upload).await.unwrap_err();

        assert!(matches!(err, IngestError::ExtractionFailed(_)));
        assert_eq!(h.archive.puts.load(Ordering::SeqCst), 0);
        assert_eq!(h.metadata.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ingest_archive_failure_persists_nothing() {
        let metadata = Arc::new(CountingMetadata::default());
        let pipeline = DocumentPipeline::new(
            Arc::new(ExtractorRegistry::with_defaults()),
            Arc::new(FixedClassifier::new(invoice_classification())),
            Arc::new(BrokenArchive),
            metadata.clone(),
        );
        let upload = UploadedFile::new("invoice.pdf", "application/pdf", sample_pdf("Invoice"));

        let err = pipeline.ingest(upload).await.unwrap_err();

        assert!(matches!(err, IngestError::ArchiveFailed(_)));
        assert_eq!(metadata.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ingest_persist_failure_leaves_archived_object() {
        let archive = Arc::new(CountingArchive::default());
        let pipeline = DocumentPipeline::new(
            Arc::new(ExtractorRegistry::with_defaults()),
            Arc::new(FixedClassifier::new(invoice_classification())),
            archive.clone(),
            Arc::new(BrokenMetadata),
        );
        let upload = UploadedFile::new("invoice.pdf", "application/pdf", sample_pdf("Invoice"));

        let err = pipeline.ingest(upload).await.unwrap_err();

        assert!(matches!(err, IngestError::PersistFailed(_)));
        // Accepted orphan: the archived object is not rolled back
        assert_eq!(archive.inner.len().await, 1);
    }

    #[tokio::test]
    async fn test_classification_defaults_never_block_ingest() {
        let h = harness(Classification::unknown());
        let upload = UploadedFile::new("report.docx", "application/msword", sample_docx("Text"));

        let record = h.pipeline.ingest(upload).await.unwrap();

        assert_eq!(record.category, "Unknown");
        assert_eq!(record.summary, "No summary available");
    }

    // -- list ----------------------------------------------------------------

    #[tokio::test]
    async fn test_list_surfaces_store_outage() {
        let pipeline = DocumentPipeline::new(
            Arc::new(ExtractorRegistry::with_defaults()),
            Arc::new(FixedClassifier::new(Classification::unknown())),
            Arc::new(MemoryArchiveStore::new()),
            Arc::new(BrokenMetadata),
        );

        let err = pipeline.list().await.unwrap_err();
        assert!(matches!(err, ListError::StoreUnavailable(_)));
    }

    // -- remove --------------------------------------------------------------

    #[tokio::test]
    async fn test_remove_deletes_exactly_one_of_each() {
        let h = harness(invoice_classification());
        let upload = UploadedFile::new("invoice.pdf", "application/pdf", sample_pdf("Invoice"));
        let record = h.pipeline.ingest(upload).await.unwrap();

        let removed = h.pipeline.remove(record.id).await.unwrap();

        assert!(removed);
        assert_eq!(h.archive.deletes.load(Ordering::SeqCst), 1);
        assert_eq!(h.metadata.deletes.load(Ordering::SeqCst), 1);
        assert!(!h.archive.inner.contains(&record.archive_key).await);
        assert!(h
            .pipeline
            .list()
            .await
            .unwrap()
            .iter()
            .all(|r| r.id != record.id));
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_false_with_no_deletes() {
        let h = harness(invoice_classification());

        let removed = h.pipeline.remove(DocumentId::new()).await.unwrap();

        assert!(!removed);
        assert_eq!(h.archive.deletes.load(Ordering::SeqCst), 0);
        assert_eq!(h.metadata.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remove_twice_is_true_then_false() {
        let h = harness(invoice_classification());
        let upload = UploadedFile::new("invoice.pdf", "application/pdf", sample_pdf("Invoice"));
        let record = h.pipeline.ingest(upload).await.unwrap();

        assert!(h.pipeline.remove(record.id).await.unwrap());
        assert!(!h.pipeline.remove(record.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_archive_failure_keeps_record() {
        let metadata = Arc::new(CountingMetadata::default());
        let working = harness(invoice_classification());
        let upload = UploadedFile::new("invoice.pdf", "application/pdf", sample_pdf("Invoice"));
        let record = working.pipeline.ingest(upload).await.unwrap();

        // Re-point the pipeline at a broken archive but the same metadata
        metadata.inner.insert(&record).await.unwrap();
        let pipeline = DocumentPipeline::new(
            Arc::new(ExtractorRegistry::with_defaults()),
            Arc::new(FixedClassifier::new(invoice_classification())),
            Arc::new(BrokenArchive),
            metadata.clone(),
        );

        let err = pipeline.remove(record.id).await.unwrap_err();

        assert!(matches!(err, RemoveError::ArchiveDeleteFailed(_)));
        // Record survives so the caller can retry
        assert_eq!(metadata.inner.len().await, 1);
        assert_eq!(metadata.deletes.load(Ordering::SeqCst), 0);
    }
}
