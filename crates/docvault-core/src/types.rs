use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category used when classification produced nothing usable.
pub const DEFAULT_CATEGORY: &str = "Unknown";

/// Summary used when classification produced nothing usable.
pub const DEFAULT_SUMMARY: &str = "No summary available";

// Newtype wrapper for type safety

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Result of classifying extracted text.
///
/// Always populated: callers never see a classification failure, only the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub summary: String,
}

impl Classification {
    pub fn new(category: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            summary: summary.into(),
        }
    }

    /// The fallback classification used whenever the inference call or its
    /// response parsing fails.
    pub fn unknown() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            summary: DEFAULT_SUMMARY.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.category == DEFAULT_CATEGORY && self.summary == DEFAULT_SUMMARY
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::unknown()
    }
}

/// A raw uploaded file as handed over by the HTTP layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Display name declared by the client, e.g. `invoice.pdf`
    pub name: String,
    /// MIME type declared by the client
    pub content_type: String,
    /// Raw file bytes
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// The persisted document record.
///
/// `archive_key` is stored as a first-class field so deletion never has to
/// re-derive the storage key from the locator URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub title: String,
    pub uploaded_at: DateTime<Utc>,
    pub archive_key: String,
    pub archive_url: String,
    pub category: String,
    pub summary: String,
}

impl DocumentRecord {
    /// Build a new record for a freshly archived and classified upload.
    pub fn new(
        title: impl Into<String>,
        archive_key: impl Into<String>,
        archive_url: impl Into<String>,
        classification: Classification,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            title: title.into(),
            uploaded_at: Utc::now(),
            archive_key: archive_key.into(),
            archive_url: archive_url.into(),
            category: classification.category,
            summary: classification.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_roundtrip() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_document_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
    }

    #[test]
    fn test_classification_defaults() {
        let c = Classification::unknown();
        assert_eq!(c.category, "Unknown");
        assert_eq!(c.summary, "No summary available");
        assert!(c.is_unknown());
        assert_eq!(Classification::default(), c);
    }

    #[test]
    fn test_record_creation() {
        let record = DocumentRecord::new(
            "invoice.pdf",
            "1700000000000-invoice.pdf",
            "https://docs.s3.us-east-1.amazonaws.com/1700000000000-invoice.pdf",
            Classification::new("Invoice", "Payment due in 30 days."),
        );

        assert_eq!(record.title, "invoice.pdf");
        assert_eq!(record.category, "Invoice");
        assert!(!record.archive_key.is_empty());
        assert!(record.uploaded_at <= Utc::now());
    }
}
