//! Cloudbox Core Library
//!
//! This crate provides the configuration, error types, constants and models
//! shared by every Cloudbox component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod upload_error;

// Re-export commonly used types
pub use config::{BaseConfig, Config, PolicyConfig, StorageConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use upload_error::{UploadError, UploadErrorKind};
