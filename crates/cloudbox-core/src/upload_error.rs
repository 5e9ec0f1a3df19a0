//! Failure taxonomy of the upload pipeline.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::LogLevel;

/// A rejected or failed upload.
///
/// Display strings are client-safe: they never carry absolute filesystem
/// paths. Infrastructure detail is logged where the failure happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Storage is not enabled")]
    StorageDisabled,

    #[error("File too large. Maximum size: {limit}")]
    TooLarge { limit: String },

    #[error("File type not allowed. Allowed types: {allowed}")]
    DisallowedExtension { allowed: String },

    #[error("Invalid file type detected")]
    DisallowedMimeType { detected: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Failed to create directory: {path}")]
    DirectoryCreateFailed { path: String },

    #[error("Failed to save file: {0}")]
    WriteFailed(String),
}

/// Payload-free discriminant of [`UploadError`], serialized as the result's `error_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadErrorKind {
    StorageDisabled,
    TooLarge,
    DisallowedExtension,
    DisallowedMimeType,
    InvalidPath,
    DirectoryCreateFailed,
    WriteFailed,
}

impl UploadErrorKind {
    pub fn http_status_code(self) -> u16 {
        match self {
            UploadErrorKind::StorageDisabled => 503,
            UploadErrorKind::TooLarge => 413,
            UploadErrorKind::DisallowedExtension | UploadErrorKind::DisallowedMimeType => 415,
            UploadErrorKind::InvalidPath => 400,
            UploadErrorKind::DirectoryCreateFailed | UploadErrorKind::WriteFailed => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadErrorKind::StorageDisabled => "STORAGE_DISABLED",
            UploadErrorKind::TooLarge => "TOO_LARGE",
            UploadErrorKind::DisallowedExtension => "DISALLOWED_EXTENSION",
            UploadErrorKind::DisallowedMimeType => "DISALLOWED_MIME_TYPE",
            UploadErrorKind::InvalidPath => "INVALID_PATH",
            UploadErrorKind::DirectoryCreateFailed => "DIRECTORY_CREATE_FAILED",
            UploadErrorKind::WriteFailed => "WRITE_FAILED",
        }
    }

    /// Server failures are logged at error level, rejections at debug.
    pub fn log_level(self) -> LogLevel {
        match self {
            UploadErrorKind::DirectoryCreateFailed | UploadErrorKind::WriteFailed => {
                LogLevel::Error
            }
            UploadErrorKind::StorageDisabled => LogLevel::Warn,
            _ => LogLevel::Debug,
        }
    }
}

impl std::fmt::Display for UploadErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl UploadError {
    pub fn kind(&self) -> UploadErrorKind {
        match self {
            UploadError::StorageDisabled => UploadErrorKind::StorageDisabled,
            UploadError::TooLarge { .. } => UploadErrorKind::TooLarge,
            UploadError::DisallowedExtension { .. } => UploadErrorKind::DisallowedExtension,
            UploadError::DisallowedMimeType { .. } => UploadErrorKind::DisallowedMimeType,
            UploadError::InvalidPath(_) => UploadErrorKind::InvalidPath,
            UploadError::DirectoryCreateFailed { .. } => UploadErrorKind::DirectoryCreateFailed,
            UploadError::WriteFailed(_) => UploadErrorKind::WriteFailed,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message() {
        let err = UploadError::TooLarge {
            limit: "50MB".to_string(),
        };
        assert_eq!(err.to_string(), "File too large. Maximum size: 50MB");
        assert!(err.to_string().to_lowercase().contains("too large"));
        assert_eq!(err.http_status_code(), 413);
    }

    #[test]
    fn test_disallowed_messages() {
        let err = UploadError::DisallowedExtension {
            allowed: "PDF, PNG".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "File type not allowed. Allowed types: PDF, PNG"
        );

        let err = UploadError::DisallowedMimeType {
            detected: "application/x-executable".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid file type detected");
        assert_eq!(err.kind(), UploadErrorKind::DisallowedMimeType);
    }

    #[test]
    fn test_kind_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&UploadErrorKind::DisallowedExtension).unwrap();
        assert_eq!(json, "\"DISALLOWED_EXTENSION\"");
        assert_eq!(
            UploadErrorKind::DirectoryCreateFailed.to_string(),
            "DIRECTORY_CREATE_FAILED"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(UploadErrorKind::StorageDisabled.http_status_code(), 503);
        assert_eq!(UploadErrorKind::InvalidPath.http_status_code(), 400);
        assert_eq!(UploadErrorKind::WriteFailed.http_status_code(), 500);
    }
}
