//! Persistence for DocVault
//!
//! Two stores, two owners: the archive store exclusively owns the raw byte
//! payload of every document; the metadata store exclusively owns the
//! authoritative record. Nothing here caches either - callers treat both as
//! the source of truth on every operation.

pub mod archive;
pub mod metadata;

// Re-exports
pub use archive::{archive_key, ArchiveError, ArchiveStore, MemoryArchiveStore, S3ArchiveStore, StoredObject};
pub use metadata::{MemoryMetadataStore, MetadataError, MetadataStore, PgMetadataStore};
