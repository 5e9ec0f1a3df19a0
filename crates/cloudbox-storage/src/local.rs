use crate::keys;
use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use cloudbox_core::constants::UPLOAD_LOG_FILE_NAME;
use cloudbox_core::models::{DeleteOutcome, FileInfo, FileStat};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use walkdir::WalkDir;

/// Permission bits of every stored object: owner read/write, world read.
#[cfg(unix)]
const STORED_FILE_MODE: u32 = 0o644;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/cloudbox/files")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:4000/files")
    ///
    /// The root itself is created by [`crate::StorageDirectory::ensure_root`].
    pub fn new(base_path: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        LocalStorage {
            base_path: base_path.into(),
            base_url: base_url.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Keys are validated first. The deepest existing ancestor of the path is
    /// then resolved so a symlinked directory cannot lead a new key outside
    /// the base directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        let key = keys::normalize_key(storage_key)?;
        let path = self.base_path.join(&key);

        let resolved = path.ancestors().find_map(|p| p.canonicalize().ok());
        if let (Ok(base_canonical), Some(resolved)) = (self.base_path.canonicalize(), resolved) {
            if resolved.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Generate public URL for file
    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// Write into a hidden sibling, sync, fix permissions, then rename into place.
async fn write_atomically(temp_path: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .await?;
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(temp_path, std::fs::Permissions::from_mode(STORED_FILE_MODE))
            .await?;
    }

    fs::rename(temp_path, path).await
}

fn modified_utc(meta: &std::fs::Metadata) -> DateTime<Utc> {
    meta.modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(true)
}

/// Blocking recursive walk; run on the blocking pool.
fn collect_files(base_path: &Path, start: &Path, base_url: &str) -> Vec<FileInfo> {
    let mut files = Vec::new();

    let walker = WalkDir::new(start)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry during listing");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(base_path) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let segments: Option<Vec<&str>> = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect();
        let Some(segments) = segments else {
            tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 file name");
            continue;
        };
        let relative_path = segments.join("/");
        if relative_path == UPLOAD_LOG_FILE_NAME {
            continue;
        }

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                tracing::warn!(error = %e, key = %relative_path, "Skipping file without metadata");
                continue;
            }
        };

        files.push(FileInfo {
            name: keys::file_name(&relative_path).to_string(),
            public_url: format!("{}/{}", base_url.trim_end_matches('/'), relative_path),
            size_bytes: meta.len(),
            modified_utc: modified_utc(&meta),
            relative_path,
        });
    }

    files
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, storage_key: &str, data: Bytes) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey("Storage key has no parent".to_string()))?;
        let temp_path = parent.join(format!(".{}.part", Uuid::new_v4().simple()));
        let size = data.len() as u64;

        let start = std::time::Instant::now();

        if let Err(e) = write_atomically(&temp_path, &path, &data).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %temp_path.display(),
                        error = %cleanup,
                        "Failed to remove temporary upload file"
                    );
                }
            }
            tracing::error!(
                path = %path.display(),
                key = %storage_key,
                error = %e,
                "Local storage write failed"
            );
            return Err(StorageError::WriteFailed(format!("{}: {}", storage_key, e.kind())));
        }

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(size)
    }

    async fn get(&self, storage_key: &str) -> StorageResult<Bytes> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                StorageError::NotFound(storage_key.to_string())
            } else {
                StorageError::ReadFailed(format!("{}: {}", storage_key, e.kind()))
            }
        })?;

        tracing::debug!(
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(Bytes::from(data))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<DeleteOutcome> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(DeleteOutcome::NotFound),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DeleteOutcome::NotFound),
            Err(e) => return Err(StorageError::IoError(e)),
        }

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DeleteOutcome::NotFound),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Local storage delete failed");
                return Err(StorageError::DeleteFailed(format!(
                    "{}: {}",
                    storage_key,
                    e.kind()
                )));
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(DeleteOutcome::Deleted)
    }

    async fn list(&self, prefix: Option<&str>) -> StorageResult<Vec<FileInfo>> {
        let prefix = keys::normalize_prefix(prefix.unwrap_or(""))?;
        let start_dir = if prefix.is_empty() {
            self.base_path.clone()
        } else {
            self.base_path.join(&prefix)
        };

        match fs::metadata(&start_dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(Vec::new()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::IoError(e)),
        }

        let base_path = self.base_path.clone();
        let base_url = self.base_url.clone();
        let start = std::time::Instant::now();

        let files = tokio::task::spawn_blocking(move || {
            collect_files(&base_path, &start_dir, &base_url)
        })
        .await
        .map_err(|e| StorageError::BackendError(format!("Listing task failed: {}", e)))?;

        tracing::debug!(
            prefix = %prefix,
            count = files.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage listing complete"
        );

        Ok(files)
    }

    async fn stat(&self, storage_key: &str) -> StorageResult<FileStat> {
        let path = self.key_to_path(storage_key)?;

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(FileStat::found(
                meta.len(),
                modified_utc(&meta),
                self.generate_url(storage_key),
            )),
            Ok(_) => Ok(FileStat::missing()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FileStat::missing()),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }

    async fn health_check(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.base_path).await?;
        if meta.is_dir() {
            Ok(())
        } else {
            Err(StorageError::BackendError(
                "Storage root is not a directory".to_string(),
            ))
        }
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.generate_url(storage_key)
    }
}
