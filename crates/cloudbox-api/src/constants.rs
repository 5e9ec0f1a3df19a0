//! API constants
//!
//! Routes are versioned under [`API_PREFIX`]. Handler path annotations use the
//! literal `/api/v0` placeholder, rewritten in the served OpenAPI document by
//! [`crate::api_doc::get_openapi_spec`].

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

/// Current API version segment
pub const API_VERSION: &str = "v0";

/// Versioned prefix for all JSON endpoints
pub const API_PREFIX: &str = "/api/v0";

/// Mount point of the public file server
pub const PUBLIC_FILES_PATH: &str = "/files";

/// Headroom on top of the upload size cap for the multipart framing, so
/// oversized files reach the pipeline's own size check.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Build a versioned API path, e.g. `api_path("/upload")` is `/api/v0/upload`.
pub fn api_path(path: &str) -> String {
    format!("{}/{}{}", API_BASE, API_VERSION, path)
}
