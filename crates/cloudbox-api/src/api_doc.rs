//! OpenAPI documentation.
//! API version is in `crate::constants::API_VERSION`.
//! Paths in handler annotations use placeholder /api/v0; they are transformed at runtime to the actual version.

use utoipa::OpenApi;

use crate::constants::{API_BASE, API_VERSION};
use crate::error;
use crate::handlers;
use cloudbox_core::{models, UploadErrorKind};

/// Placeholder version used in handler path annotations (utoipa requires compile-time literals).
const OPENAPI_PATH_PLACEHOLDER: &str = "/api/v0";

/// Transforms path keys in the OpenAPI spec from placeholder to actual API version.
fn transform_openapi_paths(spec: &mut utoipa::openapi::OpenApi, version: &str) {
    let replacement = format!("{}/{}", API_BASE, version);
    if OPENAPI_PATH_PLACEHOLDER == replacement {
        return;
    }
    let path_map = std::mem::take(&mut spec.paths.paths);
    for (key, item) in path_map {
        let new_key = key.replacen(OPENAPI_PATH_PLACEHOLDER, &replacement, 1);
        spec.paths.paths.insert(new_key, item);
    }
}

/// Returns the OpenAPI spec with path placeholders replaced by the current API version.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    transform_openapi_paths(&mut spec, API_VERSION);
    spec
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cloudbox API",
        version = "0.1.0",
        description = "Single-file upload service backed by a local file store. Uploads are validated against size, extension and sniffed content type, placed under a collision-resistant key and recorded in an audit log. All endpoints are versioned under /api/v0/."
    ),
    paths(
        handlers::upload::upload_file,
        handlers::files::list_files,
        handlers::files::stat_file,
        handlers::files::delete_file,
    ),
    components(
        schemas(
            models::UploadResult,
            models::FileInfo,
            models::FileStat,
            models::FileListResponse,
            models::DeleteResponse,
            models::DeleteOutcome,
            UploadErrorKind,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "upload", description = "File upload"),
        (name = "files", description = "Listing, inspection and deletion of stored files")
    )
)]
pub struct ApiDoc;
