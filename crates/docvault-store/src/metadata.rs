//! Metadata store: the authoritative record of every ingested document

use async_trait::async_trait;
use docvault_core::{DatabaseConfig, DocumentId, DocumentRecord};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::debug;

/// Error types for metadata operations
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, MetadataError>;

/// Trait for document record persistence
///
/// Absence is never an error here: `find_by_id` returns `None` and `delete`
/// returns `false` for ids that do not exist.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Persist a new record.
    async fn insert(&self, record: &DocumentRecord) -> Result<()>;

    /// Look up a record by id.
    async fn find_by_id(&self, id: DocumentId) -> Result<Option<DocumentRecord>>;

    /// All records, newest upload first. Ties break on id, stable within a
    /// single call.
    async fn list(&self) -> Result<Vec<DocumentRecord>>;

    /// Remove a record; reports whether one existed.
    async fn delete(&self, id: DocumentId) -> Result<bool>;
}

// One statement per constant: the extended query protocol rejects
// multiple commands in a single prepared statement.
const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id UUID PRIMARY KEY,
    title TEXT NOT NULL,
    uploaded_at TIMESTAMPTZ NOT NULL,
    archive_key TEXT NOT NULL,
    archive_url TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'Unknown',
    summary TEXT NOT NULL DEFAULT 'No summary available'
)
"#;

const CREATE_INDEX_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_documents_uploaded_at
    ON documents (uploaded_at DESC, id DESC)
"#;

/// Postgres-backed metadata store
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    /// Connect and bootstrap the schema.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the documents table and its index if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        for statement in [CREATE_TABLE_SQL, CREATE_INDEX_SQL] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn insert(&self, record: &DocumentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, title, uploaded_at, archive_key, archive_url, category, summary)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(record.uploaded_at)
        .bind(&record.archive_key)
        .bind(&record.archive_url)
        .bind(&record.category)
        .bind(&record.summary)
        .execute(&self.pool)
        .await?;

        debug!(document_id = %record.id, title = %record.title, "Inserted document record");

        Ok(())
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        let record = sqlx::query_as::<_, DocumentRecord>(
            "SELECT * FROM documents WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list(&self) -> Result<Vec<DocumentRecord>> {
        let records = sqlx::query_as::<_, DocumentRecord>(
            "SELECT * FROM documents ORDER BY uploaded_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn delete(&self, id: DocumentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-memory metadata store for tests and local development
#[derive(Default)]
pub struct MemoryMetadataStore {
    records: RwLock<Vec<DocumentRecord>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert(&self, record: &DocumentRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: DocumentId) -> Result<Option<DocumentRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<DocumentRecord>> {
        let mut records = self.records.read().await.clone();
        // Same comparator as the Postgres ORDER BY
        records.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        Ok(records)
    }

    async fn delete(&self, id: DocumentId) -> Result<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}
