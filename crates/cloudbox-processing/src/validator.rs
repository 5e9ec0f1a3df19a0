use cloudbox_core::constants::human_readable_extensions;
use cloudbox_core::{PolicyConfig, UploadError};

use crate::naming::extension_of;
use crate::upload::FileBlob;

/// Upload admission checks
///
/// Checks run in a fixed order and stop at the first failure: size, declared
/// extension, then the MIME type sniffed from the actual content. The declared
/// content type is never trusted.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    policy: PolicyConfig,
}

impl UploadValidator {
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: u64) -> Result<(), UploadError> {
        if size > self.policy.max_size_bytes {
            return Err(UploadError::TooLarge {
                limit: self.policy.max_size_display(),
            });
        }

        Ok(())
    }

    /// Validate the extension of the declared file name
    pub fn validate_extension(&self, filename: &str) -> Result<(), UploadError> {
        let extension = extension_of(filename);

        if !self.policy.allows_extension(&extension) {
            return Err(UploadError::DisallowedExtension {
                allowed: human_readable_extensions(&self.policy.allowed_extensions),
            });
        }

        Ok(())
    }

    /// Validate the sniffed content type
    pub fn validate_mime_type(&self, sniffed_mime_type: &str) -> Result<(), UploadError> {
        if !self.policy.allows_mime_type(sniffed_mime_type) {
            return Err(UploadError::DisallowedMimeType {
                detected: sniffed_mime_type.to_string(),
            });
        }

        Ok(())
    }

    /// Validate all aspects of a blob. Pure: no side effects.
    pub fn validate(&self, blob: &FileBlob) -> Result<(), UploadError> {
        self.validate_file_size(blob.size_bytes())?;
        self.validate_extension(blob.declared_name())?;
        self.validate_mime_type(blob.sniffed_mime_type())?;
        Ok(())
    }
}
