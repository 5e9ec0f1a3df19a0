//! Storage key derivation for uploaded files.
//!
//! A key is `[subdir/ | YYYY/MM/DD/]base[_YYYY-MM-DD_HH-MM-SS][_xxxxxxxx][.ext]`.
//! Time and randomness come from the [`Clock`] and [`RandomSource`] seams so
//! derivation is deterministic under test.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use cloudbox_core::{PolicyConfig, UploadError};
use cloudbox_storage::keys;
use rand::Rng;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const DATE_DIR_FORMAT: &str = "%Y/%m/%d";
const DEFAULT_BASE_NAME: &str = "file";
const MAX_BASE_LEN: usize = 200;

/// Source of the local wall-clock time used in keys.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Source of the 4 random bytes rendered as the 8 hex character suffix.
pub trait RandomSource: Send + Sync {
    fn suffix_bytes(&self) -> [u8; 4];
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn suffix_bytes(&self) -> [u8; 4] {
        let mut rng = rand::rng();
        rng.random()
    }
}

#[derive(Clone)]
pub struct PathNamer {
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl Default for PathNamer {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(ThreadRandom))
    }
}

impl PathNamer {
    pub fn new(clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>) -> Self {
        Self { clock, random }
    }

    /// Derive the storage key for `original_name`.
    ///
    /// Only the final path component of the name is used. A custom subdir
    /// replaces date organization; a traversing subdir is rejected.
    pub fn derive(
        &self,
        original_name: &str,
        custom_subdir: Option<&str>,
        policy: &PolicyConfig,
    ) -> Result<String, UploadError> {
        let subdir = match custom_subdir {
            Some(subdir) => normalize_subdir(subdir)?,
            None => None,
        };

        let (raw_base, raw_extension) = split_file_name(original_name);
        let base = sanitize_base(raw_base);
        let now = self.clock.now();

        let mut file_name = base;
        if policy.use_timestamp {
            file_name.push('_');
            file_name.push_str(&now.format(TIMESTAMP_FORMAT).to_string());
        }
        if policy.use_random_suffix {
            file_name.push('_');
            file_name.push_str(&hex::encode(self.random.suffix_bytes()));
        }
        if let Some(extension) = raw_extension {
            let extension = sanitize_component(&extension.to_lowercase());
            if !extension.is_empty() {
                file_name.push('.');
                file_name.push_str(&extension);
            }
        }

        let key = match subdir {
            Some(subdir) => format!("{}/{}", subdir, file_name),
            None if policy.organize_by_date => {
                format!("{}/{}", now.format(DATE_DIR_FORMAT), file_name)
            }
            None => file_name,
        };

        keys::normalize_key(&key).map_err(|e| UploadError::InvalidPath(e.to_string()))
    }
}

/// Split the final path component of `name` into base and extension.
pub fn split_file_name(name: &str) -> (&str, Option<&str>) {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match file_name.rsplit_once('.') {
        Some((base, extension)) => (base, Some(extension)),
        None => (file_name, None),
    }
}

/// Lower-cased extension of the final path component, empty when there is none.
pub fn extension_of(name: &str) -> String {
    split_file_name(name)
        .1
        .map(|extension| extension.to_lowercase())
        .unwrap_or_default()
}

/// Validate a caller supplied subdirectory.
///
/// Empty and `.` segments are dropped. Returns `None` when nothing is left.
pub fn normalize_subdir(subdir: &str) -> Result<Option<String>, UploadError> {
    let mut segments = Vec::new();
    for segment in subdir.split(['/', '\\']) {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return Err(UploadError::InvalidPath(
                "path must not contain '..'".to_string(),
            ));
        }
        if segment.starts_with('.') || !segment.chars().all(is_safe_char) {
            return Err(UploadError::InvalidPath(format!(
                "invalid path segment '{}'",
                segment
            )));
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        Ok(None)
    } else {
        Ok(Some(segments.join("/")))
    }
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'
}

fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if is_safe_char(c) { c } else { '_' })
        .collect()
}

fn sanitize_base(raw_base: &str) -> String {
    let sanitized = sanitize_component(raw_base);
    let trimmed: String = sanitized
        .trim_start_matches('.')
        .chars()
        .take(MAX_BASE_LEN)
        .collect();
    if trimmed.is_empty() {
        DEFAULT_BASE_NAME.to_string()
    } else {
        trimmed
    }
}
