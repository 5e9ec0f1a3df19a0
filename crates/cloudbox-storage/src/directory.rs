//! Store root and path-prefix materialization.
//!
//! The store root carries an access guard (`.htaccess`) that denies directory
//! listing and generic access and allow-lists only the configured extensions.
//! The guard is written when absent and left untouched afterwards unless
//! [`StorageDirectory::refresh_guard`] is called explicitly.

use std::io;
use std::path::{Path, PathBuf};

use cloudbox_core::config::PolicyConfig;
use cloudbox_core::constants::{files_match_alternation, GUARD_FILE_NAME};
use cloudbox_core::UploadError;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::keys;

/// Root-relative name reported when the store root itself cannot be created.
const ROOT_DISPLAY_PATH: &str = ".";

#[derive(Debug, Clone)]
pub struct StorageDirectory {
    root: PathBuf,
}

impl StorageDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn guard_path(&self) -> PathBuf {
        self.root.join(GUARD_FILE_NAME)
    }

    /// Create the store root and write the guard if it is absent.
    ///
    /// Safe to call any number of times; an existing root or guard is success.
    pub async fn ensure_root(&self, policy: &PolicyConfig) -> Result<(), UploadError> {
        create_dir_with_retry(&self.root).await.map_err(|e| {
            tracing::error!(
                path = %self.root.display(),
                error = %e,
                "Failed to create storage root"
            );
            UploadError::DirectoryCreateFailed {
                path: ROOT_DISPLAY_PATH.to_string(),
            }
        })?;

        let guard_path = self.guard_path();
        match write_new_file(&guard_path, guard_contents(policy).as_bytes()).await {
            Ok(()) => {
                tracing::info!(path = %guard_path.display(), "Storage guard file written");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => {
                tracing::error!(
                    path = %guard_path.display(),
                    error = %e,
                    "Failed to write storage guard file"
                );
                Err(UploadError::WriteFailed(GUARD_FILE_NAME.to_string()))
            }
        }
    }

    /// Regenerate the guard from the current allow-list, replacing any existing one.
    pub async fn refresh_guard(&self, policy: &PolicyConfig) -> Result<(), UploadError> {
        let guard_path = self.guard_path();
        let temp_path = self.root.join(format!("{}.tmp", GUARD_FILE_NAME));

        let result = async {
            fs::write(&temp_path, guard_contents(policy).as_bytes()).await?;
            fs::rename(&temp_path, &guard_path).await
        }
        .await;

        result.map_err(|e| {
            tracing::error!(
                path = %guard_path.display(),
                error = %e,
                "Failed to refresh storage guard file"
            );
            UploadError::WriteFailed(GUARD_FILE_NAME.to_string())
        })?;

        tracing::info!(path = %guard_path.display(), "Storage guard file refreshed");
        Ok(())
    }

    /// Create every missing directory of the key's directory portion.
    pub async fn ensure_prefix(&self, storage_key: &str) -> Result<(), UploadError> {
        let key = keys::normalize_key(storage_key)
            .map_err(|e| UploadError::InvalidPath(e.to_string()))?;

        let Some(relative_dir) = keys::parent_dir(&key) else {
            return Ok(());
        };

        let dir = self.root.join(relative_dir);
        create_dir_with_retry(&dir).await.map_err(|e| {
            tracing::error!(
                path = %dir.display(),
                error = %e,
                "Failed to create storage directory"
            );
            UploadError::DirectoryCreateFailed {
                path: relative_dir.to_string(),
            }
        })
    }
}

/// Render the guard for the policy's allowed extensions.
pub fn guard_contents(policy: &PolicyConfig) -> String {
    format!(
        "Options -Indexes\nDeny from all\n<FilesMatch \"\\.({})$\">\n    Allow from all\n</FilesMatch>\n",
        files_match_alternation(&policy.allowed_extensions)
    )
}

/// Whether the guard would let a client fetch `storage_key`.
///
/// Mirrors the guard rules: no hidden or reserved files, and the extension
/// must be allow-listed.
pub fn guard_permits(policy: &PolicyConfig, storage_key: &str) -> bool {
    let Ok(key) = keys::normalize_key(storage_key) else {
        return false;
    };
    match keys::file_name(&key).rsplit_once('.') {
        Some((_, extension)) => policy.allowed_extensions.contains(extension),
        None => false,
    }
}

/// One create-all; on failure create the parents and retry exactly once.
async fn create_dir_with_retry(dir: &Path) -> io::Result<()> {
    let first = match fs::create_dir_all(dir).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    tracing::debug!(
        path = %dir.display(),
        error = %first,
        "Directory creation failed, retrying after creating parents"
    );

    if let Some(parent) = dir.parent() {
        fs::create_dir_all(parent).await?;
    }
    match fs::create_dir(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

async fn write_new_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(contents).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn policy() -> PolicyConfig {
        PolicyConfig::new(1024, ["pdf", "png"], ["application/pdf", "image/png"])
    }

    #[test]
    fn test_guard_contents() {
        let contents = guard_contents(&policy());
        assert_eq!(
            contents,
            "Options -Indexes\nDeny from all\n<FilesMatch \"\\.(pdf|png)$\">\n    Allow from all\n</FilesMatch>\n"
        );
    }

    #[tokio::test]
    async fn test_ensure_root_is_idempotent() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("store");
        let directory = StorageDirectory::new(&root);

        directory.ensure_root(&policy()).await.unwrap();
        directory.ensure_root(&policy()).await.unwrap();

        assert!(root.is_dir());
        let guard = std::fs::read_to_string(root.join(".htaccess")).unwrap();
        assert!(guard.contains("Deny from all"));
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_existing_guard_is_not_rewritten() {
        let dir = tempdir().unwrap();
        let directory = StorageDirectory::new(dir.path());
        directory.ensure_root(&policy()).await.unwrap();

        let widened = PolicyConfig::new(1024, ["pdf", "png", "gif"], ["image/gif"]);
        directory.ensure_root(&widened).await.unwrap();
        let guard = std::fs::read_to_string(directory.guard_path()).unwrap();
        assert!(!guard.contains("gif"));

        directory.refresh_guard(&widened).await.unwrap();
        let guard = std::fs::read_to_string(directory.guard_path()).unwrap();
        assert!(guard.contains("gif|pdf|png"));
    }

    #[tokio::test]
    async fn test_ensure_prefix_creates_nested_dirs() {
        let dir = tempdir().unwrap();
        let directory = StorageDirectory::new(dir.path());

        directory.ensure_prefix("2024/01/15/a.pdf").await.unwrap();
        directory.ensure_prefix("2024/01/15/b.pdf").await.unwrap();
        directory.ensure_prefix("top.pdf").await.unwrap();

        assert!(dir.path().join("2024/01/15").is_dir());
    }

    #[tokio::test]
    async fn test_ensure_prefix_reports_relative_path() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("blocker"), b"file").unwrap();
        let directory = StorageDirectory::new(dir.path());

        let err = directory
            .ensure_prefix("blocker/inner/a.pdf")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            UploadError::DirectoryCreateFailed {
                path: "blocker/inner".to_string()
            }
        );
        assert!(!err.to_string().contains(&*dir.path().to_string_lossy()));
    }

    #[tokio::test]
    async fn test_concurrent_prefix_creation() {
        let dir = tempdir().unwrap();
        let directory = StorageDirectory::new(dir.path());

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let directory = directory.clone();
                tokio::spawn(async move {
                    directory
                        .ensure_prefix(&format!("shared/deep/path/{}.pdf", i))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert!(dir.path().join("shared/deep/path").is_dir());
    }

    #[test]
    fn test_guard_permits() {
        let policy = policy();
        assert!(guard_permits(&policy, "2024/01/15/a.pdf"));
        assert!(!guard_permits(&policy, "a.exe"));
        assert!(!guard_permits(&policy, ".htaccess"));
        assert!(!guard_permits(&policy, "upload_log.txt"));
        assert!(!guard_permits(&policy, "noext"));
        assert!(!guard_permits(&policy, "../a.pdf"));
    }
}
