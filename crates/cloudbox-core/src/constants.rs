//! File category constants and store layout names.
//!
//! Extensions are grouped into the categories the upload policy is built from.
//! MIME lists contain both the conventional names and the names reported by
//! the content sniffer for the same formats.

/// Name of the access-control guard written into the store root.
pub const GUARD_FILE_NAME: &str = ".htaccess";

/// Name of the append-only upload audit log in the store root.
pub const UPLOAD_LOG_FILE_NAME: &str = "upload_log.txt";

/// MIME type reported for content without a recognizable signature or text encoding.
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// MIME type reported for signature-less content that decodes as text.
pub const TEXT_PLAIN_MIME: &str = "text/plain";

/// MIME type reported for zero-length content.
pub const EMPTY_MIME: &str = "application/x-empty";

pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "csv"];

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

pub const EXECUTABLE_EXTENSIONS: &[&str] = &[
    "exe", "msi", "deb", "rpm", "app", "dmg", "pkg", "run", "sh", "bat", "cmd",
];

pub const SCRIPT_EXTENSIONS: &[&str] = &["php", "php3", "php4", "php5", "phtml"];

pub const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "text/csv",
];

pub const IMAGE_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif"];

pub const EXECUTABLE_MIME_TYPES: &[&str] = &[
    "application/x-msdownload",
    "application/x-msi",
    "application/vnd.debian.binary-package",
    "application/x-rpm",
    "application/x-apple-diskimage",
    "application/x-executable",
    "application/x-sh",
    "application/x-shellscript",
    "text/x-shellscript",
    "application/x-bat",
    "application/x-msdos-program",
    // Names produced by the magic-number sniffer
    "application/vnd.microsoft.portable-executable",
    "application/x-ole-storage",
];

pub const SCRIPT_MIME_TYPES: &[&str] = &[
    "application/x-httpd-php",
    "application/x-php",
    "text/x-php",
    "text/php",
    "application/php",
];

/// Default allow-list: documents and images.
pub fn default_extensions() -> Vec<String> {
    DOCUMENT_EXTENSIONS
        .iter()
        .chain(IMAGE_EXTENSIONS)
        .map(|s| s.to_string())
        .collect()
}

/// Default MIME allow-list matching [`default_extensions`].
pub fn default_mime_types() -> Vec<String> {
    DOCUMENT_MIME_TYPES
        .iter()
        .chain(IMAGE_MIME_TYPES)
        .map(|s| s.to_string())
        .collect()
}

/// Extensions of the executable and script categories.
pub fn executable_extensions() -> Vec<String> {
    EXECUTABLE_EXTENSIONS
        .iter()
        .chain(SCRIPT_EXTENSIONS)
        .map(|s| s.to_string())
        .collect()
}

/// MIME types of the executable and script categories.
pub fn executable_mime_types() -> Vec<String> {
    EXECUTABLE_MIME_TYPES
        .iter()
        .chain(SCRIPT_MIME_TYPES)
        .map(|s| s.to_string())
        .collect()
}

/// Regex alternation of the extensions, for a `FilesMatch` directive.
///
/// `["pdf", "tar.gz"]` renders as `pdf|tar\.gz`.
pub fn files_match_alternation<'a>(extensions: impl IntoIterator<Item = &'a String>) -> String {
    extensions
        .into_iter()
        .map(|ext| regex::escape(ext))
        .collect::<Vec<_>>()
        .join("|")
}

/// Value for an HTML `accept` attribute, e.g. `.pdf,.png`.
pub fn html_accept_value<'a>(extensions: impl IntoIterator<Item = &'a String>) -> String {
    extensions
        .into_iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",")
}

/// Upper-cased, comma separated list, e.g. `PDF, PNG`.
pub fn human_readable_extensions<'a>(
    extensions: impl IntoIterator<Item = &'a String>,
) -> String {
    extensions
        .into_iter()
        .map(|ext| ext.to_uppercase())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Byte count for messages: whole units print bare (`50MB`), other sizes keep
/// one decimal (`1.5MB`), anything under 1KB prints in bytes.
pub fn human_readable_size(bytes: u64) -> String {
    const UNITS: [(&str, u64); 3] = [("GB", 1 << 30), ("MB", 1 << 20), ("KB", 1 << 10)];

    for (unit, scale) in UNITS {
        if bytes >= scale {
            if bytes % scale == 0 {
                return format!("{}{}", bytes / scale, unit);
            }
            return format!("{:.1}{}", bytes as f64 / scale as f64, unit);
        }
    }
    format!("{} bytes", bytes)
}
