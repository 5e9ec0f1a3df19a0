//! Listing, stat and delete of stored files.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use cloudbox_core::models::{DeleteOutcome, DeleteResponse, FileListResponse, FileStat};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Directory prefix to list; the whole store when omitted
    pub prefix: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v0/files",
    tag = "files",
    params(ListQuery),
    responses(
        (status = 200, description = "Files under the prefix", body = FileListResponse),
        (status = 400, description = "Invalid prefix", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "list_files"))]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<FileListResponse>, HttpAppError> {
    let files = state.placer.list(query.prefix.as_deref()).await?;
    Ok(Json(FileListResponse::from(files)))
}

#[utoipa::path(
    get,
    path = "/api/v0/stat/{key}",
    tag = "files",
    params(("key" = String, Path, description = "Storage key of the file")),
    responses(
        (status = 200, description = "File status, `exists` is false when absent", body = FileStat),
        (status = 400, description = "Invalid key", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "stat_file"))]
pub async fn stat_file(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<FileStat>, HttpAppError> {
    let stat = state.placer.stat(&key).await?;
    Ok(Json(stat))
}

#[utoipa::path(
    delete,
    path = "/api/v0/files/{key}",
    tag = "files",
    params(("key" = String, Path, description = "Storage key of the file")),
    responses(
        (status = 200, description = "File deleted", body = DeleteResponse),
        (status = 404, description = "File not found", body = DeleteResponse),
        (status = 400, description = "Invalid key", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let outcome = state.placer.delete(&key).await?;

    let status = match outcome {
        DeleteOutcome::Deleted => {
            tracing::info!(key = %key, "File deleted");
            StatusCode::OK
        }
        DeleteOutcome::NotFound => StatusCode::NOT_FOUND,
    };
    Ok((status, Json(DeleteResponse::from(outcome))))
}
