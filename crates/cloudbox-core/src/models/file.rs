//! Stored object descriptors returned by list, stat and delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored object found by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileInfo {
    /// File name (last key segment)
    pub name: String,
    /// Storage key relative to the store root
    pub relative_path: String,
    pub size_bytes: u64,
    pub modified_utc: DateTime<Utc>,
    pub public_url: String,
}

/// Existence and metadata of a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileStat {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_utc: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl FileStat {
    pub fn missing() -> Self {
        Self {
            exists: false,
            size_bytes: None,
            modified_utc: None,
            public_url: None,
        }
    }

    pub fn found(size_bytes: u64, modified_utc: DateTime<Utc>, public_url: String) -> Self {
        Self {
            exists: true,
            size_bytes: Some(size_bytes),
            modified_utc: Some(modified_utc),
            public_url: Some(public_url),
        }
    }
}

/// Outcome of a delete. A missing object is reported, not raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Response body for a file listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileListResponse {
    pub files: Vec<FileInfo>,
    pub count: usize,
}

impl From<Vec<FileInfo>> for FileListResponse {
    fn from(files: Vec<FileInfo>) -> Self {
        Self {
            count: files.len(),
            files,
        }
    }
}

/// Response body for a delete
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<DeleteOutcome> for DeleteResponse {
    fn from(outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted => Self {
                success: true,
                message: Some("File deleted successfully".to_string()),
                error: None,
            },
            DeleteOutcome::NotFound => Self {
                success: false,
                message: None,
                error: Some("File not found".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_stat_serializes_exists_only() {
        let json = serde_json::to_value(FileStat::missing()).unwrap();
        assert_eq!(json, serde_json::json!({ "exists": false }));
    }

    #[test]
    fn test_delete_response_from_outcome() {
        let deleted = DeleteResponse::from(DeleteOutcome::Deleted);
        assert!(deleted.success);
        assert!(deleted.error.is_none());

        let missing = DeleteResponse::from(DeleteOutcome::NotFound);
        assert!(!missing.success);
        assert_eq!(missing.error.as_deref(), Some("File not found"));
    }
}
