//! Storage key validation shared by every component.

use cloudbox_core::constants::UPLOAD_LOG_FILE_NAME;

use crate::traits::{StorageError, StorageResult};

/// Validate a storage key and return it in canonical form.
///
/// Rejects empty keys, a leading `/`, backslashes, NUL bytes, `..`, `.`,
/// empty segments, hidden (dot-prefixed) segments and the reserved upload
/// log name.
pub fn normalize_key(storage_key: &str) -> StorageResult<String> {
    let key = storage_key.trim();
    if key.is_empty() {
        return Err(StorageError::InvalidKey(
            "Storage key must not be empty".to_string(),
        ));
    }
    if key.starts_with('/') || key.contains('\\') || key.contains('\0') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    for segment in key.split('/') {
        validate_segment(segment)?;
    }
    if key == UPLOAD_LOG_FILE_NAME {
        return Err(StorageError::InvalidKey(
            "Storage key refers to a reserved file".to_string(),
        ));
    }
    Ok(key.to_string())
}

/// Validate a listing prefix. Empty (or `/`) means the store root.
pub fn normalize_prefix(prefix: &str) -> StorageResult<String> {
    let prefix = prefix.trim().trim_matches('/');
    if prefix.is_empty() {
        return Ok(String::new());
    }
    if prefix.contains('\\') || prefix.contains('\0') {
        return Err(StorageError::InvalidKey(
            "Prefix contains invalid characters".to_string(),
        ));
    }
    for segment in prefix.split('/') {
        validate_segment(segment)?;
    }
    Ok(prefix.to_string())
}

/// Directory portion of a key, `None` for top-level keys.
pub fn parent_dir(storage_key: &str) -> Option<&str> {
    storage_key.rsplit_once('/').map(|(dir, _)| dir)
}

/// Last segment of a key.
pub fn file_name(storage_key: &str) -> &str {
    storage_key
        .rsplit_once('/')
        .map(|(_, name)| name)
        .unwrap_or(storage_key)
}

fn validate_segment(segment: &str) -> StorageResult<()> {
    if segment.is_empty() {
        return Err(StorageError::InvalidKey(
            "Storage key contains an empty segment".to_string(),
        ));
    }
    if segment == ".." || segment == "." {
        return Err(StorageError::InvalidKey(
            "Storage key contains a relative segment".to_string(),
        ));
    }
    if segment.starts_with('.') {
        return Err(StorageError::InvalidKey(
            "Storage key contains a hidden segment".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert_eq!(normalize_key("a.pdf").unwrap(), "a.pdf");
        assert_eq!(
            normalize_key("2024/01/15/resume_x.pdf").unwrap(),
            "2024/01/15/resume_x.pdf"
        );
        assert!(normalize_key("docs/upload_log.txt").is_ok());
    }

    #[test]
    fn test_traversal_rejected() {
        for key in [
            "../etc/passwd",
            "a/../../b",
            "/etc/passwd",
            "a//b",
            "a/./b",
            "a\\b",
            ".htaccess",
            "dir/.secret",
            "",
            "upload_log.txt",
        ] {
            assert!(
                matches!(normalize_key(key), Err(StorageError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_prefix() {
        assert_eq!(normalize_prefix("").unwrap(), "");
        assert_eq!(normalize_prefix("/").unwrap(), "");
        assert_eq!(normalize_prefix("2024/01/").unwrap(), "2024/01");
        assert!(normalize_prefix("../x").is_err());
    }

    #[test]
    fn test_parent_and_name() {
        assert_eq!(parent_dir("2024/01/15/a.pdf"), Some("2024/01/15"));
        assert_eq!(parent_dir("a.pdf"), None);
        assert_eq!(file_name("2024/01/15/a.pdf"), "a.pdf");
        assert_eq!(file_name("a.pdf"), "a.pdf");
    }
}
