//! Multipart form handling for the upload endpoint

use axum::extract::Multipart;
use bytes::Bytes;
use cloudbox_core::AppError;

use crate::error::HttpAppError;

/// The single file part of an upload form.
#[derive(Debug)]
pub struct MultipartFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Extract the file from a multipart form.
///
/// Exactly one part named `field_name` is accepted; other parts are drained
/// and ignored. A missing or repeated file part is a bad request.
pub async fn extract_multipart_file(
    mut multipart: Multipart,
    field_name: &str,
) -> Result<MultipartFile, HttpAppError> {
    let mut file: Option<MultipartFile> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            // Consume the part so the stream advances
            field.bytes().await?;
            continue;
        }

        if file.is_some() {
            return Err(AppError::BadRequest(format!(
                "Only one file per request is allowed; send exactly one field named '{}'",
                field_name
            ))
            .into());
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        file = Some(MultipartFile {
            file_name,
            content_type,
            data,
        });
    }

    file.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()).into())
}

/// Treat an empty `path` query parameter as absent.
pub fn custom_subdir(path: Option<&str>) -> Option<&str> {
    path.map(str::trim).filter(|p| !p.is_empty())
}
