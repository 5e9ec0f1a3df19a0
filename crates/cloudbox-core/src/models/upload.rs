use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ClientInfo;
use crate::upload_error::{UploadError, UploadErrorKind};

/// Result of one upload call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<UploadErrorKind>,
}

impl UploadResult {
    pub fn stored(storage_key: String, public_url: String, size_bytes: u64) -> Self {
        Self {
            success: true,
            storage_key: Some(storage_key),
            public_url: Some(public_url),
            size_bytes: Some(size_bytes),
            error_message: None,
            error_code: None,
        }
    }

    pub fn failed(error: &UploadError) -> Self {
        Self {
            success: false,
            storage_key: None,
            public_url: None,
            size_bytes: None,
            error_message: Some(error.to_string()),
            error_code: Some(error.kind()),
        }
    }

    /// HTTP status the transport should answer with.
    pub fn http_status_code(&self) -> u16 {
        match self.error_code {
            Some(kind) => kind.http_status_code(),
            None => 200,
        }
    }
}

/// One line of the upload audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLogEntry {
    pub timestamp: DateTime<Utc>,
    pub original_name: String,
    pub stored_key: String,
    pub ip_address: String,
    pub user_agent: String,
}

impl UploadLogEntry {
    pub fn new(original_name: &str, stored_key: &str, client: &ClientInfo) -> Self {
        Self {
            timestamp: Utc::now(),
            original_name: original_name.to_string(),
            stored_key: stored_key.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client.user_agent.clone(),
        }
    }
}
