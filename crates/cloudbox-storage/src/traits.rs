//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use bytes::Bytes;
use cloudbox_core::models::{DeleteOutcome, FileInfo, FileStat};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// A key→bytes store addressed by relative storage keys. The upload pipeline
/// and the HTTP handlers only talk to this trait, so tests and alternative
/// backends can be swapped in without touching them.
///
/// `put` expects the parent directory of the key to exist already; directory
/// materialization belongs to [`crate::StorageDirectory`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Atomically write `data` under `storage_key` and return the stored size.
    ///
    /// Readers never observe a partially written object. Stored objects are
    /// never executable.
    async fn put(&self, storage_key: &str, data: Bytes) -> StorageResult<u64>;

    /// Read a stored object
    async fn get(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Remove an object. A missing object is reported as [`DeleteOutcome::NotFound`].
    async fn delete(&self, storage_key: &str) -> StorageResult<DeleteOutcome>;

    /// Recursively enumerate stored objects below `prefix` (whole store when `None`).
    ///
    /// Hidden files and the upload log are never listed. A missing prefix
    /// yields an empty list.
    async fn list(&self, prefix: Option<&str>) -> StorageResult<Vec<FileInfo>>;

    /// Existence, size and modification time of one key
    async fn stat(&self, storage_key: &str) -> StorageResult<FileStat>;

    /// Verify the backend is usable (used by readiness probes)
    async fn health_check(&self) -> StorageResult<()>;

    /// Public URL of a key
    fn public_url(&self, storage_key: &str) -> String;
}
