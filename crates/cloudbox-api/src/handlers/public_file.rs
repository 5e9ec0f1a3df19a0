//! Public file route: serves stored objects under `/files/`.
//!
//! Applies the same rules as the `.htaccess` guard written into the store
//! root: only allowed extensions, never hidden files or the upload log, no
//! directory listing.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use cloudbox_core::AppError;
use cloudbox_processing::sniff_mime_type;
use cloudbox_storage::{directory::guard_permits, StorageError};

use crate::error::HttpAppError;
use crate::state::AppState;

#[tracing::instrument(skip(state), fields(operation = "get_public_file"))]
pub async fn get_public_file(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, HttpAppError> {
    let not_found = || HttpAppError::from(AppError::NotFound("File not found".to_string()));

    if !guard_permits(state.config.policy(), &key) {
        tracing::debug!(key = %key, "Public file request refused by guard rules");
        return Err(not_found());
    }

    let data = match state.storage.get(&key).await {
        Ok(data) => data,
        Err(StorageError::NotFound(_)) | Err(StorageError::InvalidKey(_)) => {
            return Err(not_found())
        }
        Err(e) => {
            tracing::error!(error = %e, key = %key, "Failed to read file from storage");
            return Err(e.into());
        }
    };

    let content_type = sniff_mime_type(&data);
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, data.len())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(data))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}
