//! Types for the upload pipeline.

use bytes::Bytes;

use crate::sniff::sniff_mime_type;

/// An incoming file, owned by a single upload call.
///
/// The size and the sniffed MIME type are computed from the content when the
/// blob is built, so they always describe the actual bytes.
#[derive(Clone, Debug)]
pub struct FileBlob {
    declared_name: String,
    declared_mime_type: Option<String>,
    content: Bytes,
    sniffed_mime_type: String,
}

impl FileBlob {
    pub fn new(
        declared_name: impl Into<String>,
        declared_mime_type: Option<String>,
        content: Bytes,
    ) -> Self {
        let sniffed_mime_type = sniff_mime_type(&content);
        Self {
            declared_name: declared_name.into(),
            declared_mime_type,
            content,
            sniffed_mime_type,
        }
    }

    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    /// Content type claimed by the client; informational only.
    pub fn declared_mime_type(&self) -> Option<&str> {
        self.declared_mime_type.as_deref()
    }

    pub fn sniffed_mime_type(&self) -> &str {
        &self.sniffed_mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }
}
