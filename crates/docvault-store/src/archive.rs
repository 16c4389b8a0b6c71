//! Archive store: durable object storage for original upload bytes

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use docvault_core::ArchiveConfig;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Error types for archive operations
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Archive request failed: {0}")]
    Request(String),

    #[error("Archive rejected the operation: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

/// A successfully archived object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Storage key the object was written under
    pub key: String,
    /// Dereferenceable locator for the object
    pub locator: String,
}

/// Build a storage key for an upload.
///
/// Prefixing the display name with the current timestamp keeps keys unique
/// per call, so two uploads sharing a filename never overwrite each other.
pub fn archive_key(filename: &str) -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), filename)
}

/// Trait for durable object storage
///
/// `delete` is idempotent from the caller's perspective: deleting an
/// already-absent key reports success, since either way the object is no
/// longer present.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Write an object; `key` must be unique per call.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject>;

    /// Remove an object by key.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Archive store backed by S3
pub struct S3ArchiveStore {
    client: aws_sdk_s3::Client,
    config: ArchiveConfig,
}

impl S3ArchiveStore {
    /// Build a store from environment-supplied AWS credentials.
    pub async fn from_env(config: ArchiveConfig) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        Self {
            client: aws_sdk_s3::Client::new(&shared),
            config,
        }
    }

    pub fn new(client: aws_sdk_s3::Client, config: ArchiveConfig) -> Self {
        Self { client, config }
    }

    fn locator(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.config.bucket, self.config.region, key
        )
    }
}

#[async_trait]
impl ArchiveStore for S3ArchiveStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject> {
        let size = bytes.len();

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| ArchiveError::Request(e.to_string()))?;

        debug!(key = %key, bytes = size, "Archived object");

        Ok(StoredObject {
            key: key.to_string(),
            locator: self.locator(key),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // S3 reports success for absent keys, which is exactly the
        // idempotent contract callers rely on.
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ArchiveError::Request(e.to_string()))?;

        debug!(key = %key, "Deleted archived object");

        Ok(())
    }
}

/// In-memory archive store for tests and local development
#[derive(Default)]
pub struct MemoryArchiveStore {
    objects: RwLock<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ArchiveStore for MemoryArchiveStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), (bytes, content_type.to_string()));

        Ok(StoredObject {
            key: key.to_string(),
            locator: format!("memory://{}", key),
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        // Removing an absent key is still success
        self.objects.write().await.remove(key);
        Ok(())
    }
}
