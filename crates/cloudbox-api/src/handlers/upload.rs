use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use cloudbox_core::models::UploadResult;
use cloudbox_core::{AppError, UploadError};
use cloudbox_processing::FileBlob;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::ip_extraction::RequestClient;
use crate::utils::upload::{custom_subdir, extract_multipart_file};

#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadQuery {
    /// Custom subdirectory replacing the date-based layout
    pub path: Option<String>,
}

/// Upload a single file
///
/// Reads exactly one file part from the multipart form and hands it to the
/// placement pipeline. The response body is always an `UploadResult`; the
/// status reflects the failure kind when the upload is refused.
#[utoipa::path(
    post,
    path = "/api/v0/upload",
    tag = "upload",
    params(UploadQuery),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = UploadResult),
        (status = 400, description = "Missing file or invalid path", body = ErrorResponse),
        (status = 413, description = "File too large", body = UploadResult),
        (status = 415, description = "File type not allowed", body = UploadResult),
        (status = 500, description = "Storage failure", body = UploadResult),
        (status = 503, description = "Storage disabled", body = UploadResult)
    )
)]
#[tracing::instrument(
    skip(state, client, multipart),
    fields(path = ?query.path, operation = "upload_file")
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    RequestClient(client): RequestClient,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let multipart = multipart?;
    let field_name = &state.config.storage().upload_field_name;
    let file = match extract_multipart_file(multipart, field_name).await {
        Ok(file) => file,
        // Body cut off by the request size limit
        Err(HttpAppError(AppError::PayloadTooLarge(_))) => {
            let err = UploadError::TooLarge {
                limit: state.config.policy().max_size_display(),
            };
            tracing::debug!(error = %err, "Upload body exceeded the request limit");
            return Ok(upload_response(UploadResult::failed(&err)));
        }
        Err(err) => return Err(err),
    };

    tracing::debug!(
        file_name = %file.file_name,
        declared_content_type = ?file.content_type,
        size_bytes = file.data.len(),
        "Received upload"
    );

    let blob = FileBlob::new(file.file_name, file.content_type, file.data);
    let result = state
        .placer
        .upload(blob, custom_subdir(query.path.as_deref()), &client)
        .await;

    Ok(upload_response(result))
}

fn upload_response(result: UploadResult) -> (StatusCode, Json<UploadResult>) {
    let status =
        StatusCode::from_u16(result.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(result))
}

/// Any method other than POST on the upload route
pub async fn upload_method_not_allowed() -> HttpAppError {
    AppError::MethodNotAllowed("Only POST method allowed".to_string()).into()
}
