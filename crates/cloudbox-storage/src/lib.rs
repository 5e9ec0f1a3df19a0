//! Cloudbox Storage Library
//!
//! This crate provides the storage abstraction and the local filesystem
//! backend, plus the store-root housekeeping used by the upload pipeline:
//! directory materialization with its access guard, and the upload audit log.
//!
//! # Storage key format
//!
//! Keys are relative, forward-slash separated paths such as
//! `2024/01/15/report_2024-01-15_10-30-00_a1b2c3d4.pdf`. Keys must not contain
//! `..`, a leading `/`, empty or hidden segments. Validation is centralized in
//! the `keys` module so every component agrees on what a key is.

pub mod directory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;
pub mod upload_log;

// Re-export commonly used types
pub use directory::StorageDirectory;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
pub use upload_log::UploadLog;
