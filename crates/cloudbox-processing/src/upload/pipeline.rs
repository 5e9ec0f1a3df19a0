//! The upload orchestrator.
//!
//! [`Placer::upload`] runs the admission and placement steps in order and
//! always answers with an [`UploadResult`]; failures are reported in the
//! result, never raised. Infrastructure detail goes to the log, the result
//! only carries client-safe messages.

use std::sync::Arc;

use cloudbox_core::models::{
    ClientInfo, DeleteOutcome, FileInfo, FileStat, UploadLogEntry, UploadResult,
};
use cloudbox_core::{LogLevel, StorageConfig, UploadError};
use cloudbox_storage::{Storage, StorageDirectory, StorageResult, UploadLog};

use super::types::FileBlob;
use crate::naming::PathNamer;
use crate::validator::UploadValidator;

pub struct Placer {
    config: Arc<StorageConfig>,
    storage: Arc<dyn Storage>,
    directory: StorageDirectory,
    log: Arc<UploadLog>,
    namer: PathNamer,
    validator: UploadValidator,
}

impl Placer {
    pub fn new(config: Arc<StorageConfig>, storage: Arc<dyn Storage>) -> Self {
        let directory = StorageDirectory::new(config.root_path());
        let log = Arc::new(UploadLog::in_root(config.root_path()));
        let validator = UploadValidator::new(config.policy.clone());

        Self {
            config,
            storage,
            directory,
            log,
            namer: PathNamer::default(),
            validator,
        }
    }

    /// Replace the key derivation (fixed clock or randomness in tests).
    pub fn with_namer(mut self, namer: PathNamer) -> Self {
        self.namer = namer;
        self
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn directory(&self) -> &StorageDirectory {
        &self.directory
    }

    pub fn upload_log(&self) -> &UploadLog {
        &self.log
    }

    /// Start-up preparation: create the store root and its guard, and
    /// regenerate the guard when configured to.
    pub async fn prepare(&self) -> Result<(), UploadError> {
        let policy = self.validator.policy();
        self.directory.ensure_root(policy).await?;
        if self.config.refresh_guard_on_startup {
            self.directory.refresh_guard(policy).await?;
        }
        Ok(())
    }

    /// Admit and place one file.
    pub async fn upload(
        &self,
        blob: FileBlob,
        custom_subdir: Option<&str>,
        client: &ClientInfo,
    ) -> UploadResult {
        let start = std::time::Instant::now();

        match self.place(&blob, custom_subdir).await {
            Ok((storage_key, size_bytes)) => {
                if self.config.log_uploads {
                    let entry = UploadLogEntry::new(blob.declared_name(), &storage_key, client);
                    if let Err(e) = self.log.append(&entry).await {
                        tracing::warn!(
                            error = %e,
                            key = %storage_key,
                            "Failed to append upload log entry"
                        );
                    }
                }

                tracing::info!(
                    key = %storage_key,
                    original_name = %blob.declared_name(),
                    mime_type = %blob.sniffed_mime_type(),
                    size_bytes = size_bytes,
                    client_ip = %client.ip_address,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload stored"
                );

                let public_url = self.config.public_url(&storage_key);
                UploadResult::stored(storage_key, public_url, size_bytes)
            }
            Err(err) => {
                let kind = err.kind();
                match kind.log_level() {
                    LogLevel::Debug => tracing::debug!(
                        error_code = %kind,
                        error = %err,
                        original_name = %blob.declared_name(),
                        size_bytes = blob.size_bytes(),
                        "Upload rejected"
                    ),
                    LogLevel::Warn => tracing::warn!(
                        error_code = %kind,
                        error = %err,
                        "Upload refused"
                    ),
                    LogLevel::Error => tracing::error!(
                        error_code = %kind,
                        error = %err,
                        original_name = %blob.declared_name(),
                        "Upload failed"
                    ),
                }
                UploadResult::failed(&err)
            }
        }
    }

    async fn place(
        &self,
        blob: &FileBlob,
        custom_subdir: Option<&str>,
    ) -> Result<(String, u64), UploadError> {
        if !self.config.storage_enabled {
            return Err(UploadError::StorageDisabled);
        }

        self.validator.validate(blob)?;

        let policy = self.validator.policy();
        let storage_key = self
            .namer
            .derive(blob.declared_name(), custom_subdir, policy)?;

        self.directory.ensure_root(policy).await?;
        self.directory.ensure_prefix(&storage_key).await?;

        let size_bytes = self
            .storage
            .put(&storage_key, blob.content().clone())
            .await
            .map_err(|e| {
                tracing::error!(key = %storage_key, error = %e, "Storage write failed");
                UploadError::WriteFailed(storage_key.clone())
            })?;

        Ok((storage_key, size_bytes))
    }

    pub async fn delete(&self, storage_key: &str) -> StorageResult<DeleteOutcome> {
        self.storage.delete(storage_key).await
    }

    pub async fn list(&self, prefix: Option<&str>) -> StorageResult<Vec<FileInfo>> {
        self.storage.list(prefix).await
    }

    pub async fn stat(&self, storage_key: &str) -> StorageResult<FileStat> {
        self.storage.stat(storage_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{Clock, RandomSource};
    use bytes::Bytes;
    use chrono::{NaiveDate, NaiveDateTime};
    use cloudbox_core::{PolicyConfig, UploadErrorKind};
    use cloudbox_storage::LocalStorage;
    use std::collections::HashSet;
    use tempfile::{tempdir, TempDir};

    const PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF\n";

    struct FixedClock(NaiveDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            self.0
        }
    }

    struct FixedRandom;

    impl RandomSource for FixedRandom {
        fn suffix_bytes(&self) -> [u8; 4] {
            [0xde, 0xad, 0xbe, 0xef]
        }
    }

    fn placer_with(config: StorageConfig) -> Placer {
        let config = Arc::new(config);
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(
            config.root_path(),
            config.public_base_url.clone(),
        ));
        Placer::new(config, storage)
    }

    fn test_placer() -> (TempDir, Placer) {
        let dir = tempdir().unwrap();
        let root = dir.path().join("files");
        let placer = placer_with(StorageConfig::new(&root, "http://localhost:4000/files/"));
        (dir, placer)
    }

    fn pdf_blob(name: &str) -> FileBlob {
        FileBlob::new(name, Some("application/pdf".to_string()), Bytes::from_static(PDF))
    }

    #[tokio::test]
    async fn test_upload_stores_file_and_logs() {
        let (_dir, placer) = test_placer();
        let client = ClientInfo::new("198.51.100.4", "test-agent");

        let result = placer.upload(pdf_blob("resume.pdf"), None, &client).await;

        assert!(result.success, "{:?}", result);
        let key = result.storage_key.clone().unwrap();
        let stored = std::fs::read(placer.config().root_path().join(&key)).unwrap();
        assert_eq!(stored, PDF);
        assert_eq!(result.size_bytes, Some(PDF.len() as u64));
        assert_eq!(
            result.public_url.as_deref(),
            Some(format!("http://localhost:4000/files/{}", key).as_str())
        );

        assert!(placer.directory().guard_path().exists());

        let entries = placer.upload_log().read_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].original_name, "resume.pdf");
        assert_eq!(entries[0].stored_key, key);
        assert_eq!(entries[0].ip_address, "198.51.100.4");
        assert_eq!(entries[0].user_agent, "test-agent");
    }

    #[tokio::test]
    async fn test_upload_with_fixed_clock_and_random() {
        let (_dir, placer) = test_placer();
        let now = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let placer = placer.with_namer(PathNamer::new(
            Arc::new(FixedClock(now)),
            Arc::new(FixedRandom),
        ));

        let result = placer
            .upload(pdf_blob("resume.pdf"), None, &ClientInfo::default())
            .await;
        assert_eq!(
            result.storage_key.as_deref(),
            Some("2024/01/15/resume_2024-01-15_08-00-00_deadbeef.pdf")
        );

        let result = placer
            .upload(pdf_blob("resume.pdf"), Some("clients/acme"), &ClientInfo::default())
            .await;
        assert_eq!(
            result.storage_key.as_deref(),
            Some("clients/acme/resume_2024-01-15_08-00-00_deadbeef.pdf")
        );
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected_without_writing() {
        let (_dir, placer) = test_placer();
        let blob = FileBlob::new("big.pdf", None, Bytes::from(vec![b'a'; 60 * 1024 * 1024]));

        let result = placer.upload(blob, None, &ClientInfo::default()).await;

        assert!(!result.success);
        assert_eq!(result.error_code, Some(UploadErrorKind::TooLarge));
        assert!(result
            .error_message
            .unwrap()
            .to_lowercase()
            .contains("too large"));
        assert!(placer.list(None).await.unwrap().is_empty());
        assert!(placer.upload_log().read_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejections_map_to_kinds() {
        let (_dir, placer) = test_placer();
        let client = ClientInfo::default();

        let result = placer.upload(pdf_blob("script.php"), None, &client).await;
        assert_eq!(result.error_code, Some(UploadErrorKind::DisallowedExtension));

        let mut elf = b"\x7FELF\x02\x01\x01\0".to_vec();
        elf.resize(128, 0);
        let result = placer
            .upload(FileBlob::new("report.pdf", None, Bytes::from(elf)), None, &client)
            .await;
        assert_eq!(result.error_code, Some(UploadErrorKind::DisallowedMimeType));
        assert_eq!(result.error_message.as_deref(), Some("Invalid file type detected"));

        let result = placer.upload(pdf_blob("a.pdf"), Some("../escape"), &client).await;
        assert_eq!(result.error_code, Some(UploadErrorKind::InvalidPath));

        assert!(placer.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_storage_refuses_uploads() {
        let dir = tempdir().unwrap();
        let mut config = StorageConfig::new(dir.path(), "http://localhost:4000/files");
        config.storage_enabled = false;
        let placer = placer_with(config);

        let result = placer
            .upload(pdf_blob("a.pdf"), None, &ClientInfo::default())
            .await;
        assert_eq!(result.error_code, Some(UploadErrorKind::StorageDisabled));
        assert_eq!(result.http_status_code(), 503);
    }

    #[tokio::test]
    async fn test_upload_log_can_be_disabled() {
        let dir = tempdir().unwrap();
        let mut config = StorageConfig::new(dir.path(), "http://localhost:4000/files");
        config.log_uploads = false;
        let placer = placer_with(config);

        let result = placer
            .upload(pdf_blob("a.pdf"), None, &ClientInfo::default())
            .await;
        assert!(result.success);
        assert!(!placer.upload_log().path().exists());
    }

    #[tokio::test]
    async fn test_directory_failure_is_reported() {
        let dir = tempdir().unwrap();
        let policy = PolicyConfig::default().with_naming(false, false, false);
        let placer = placer_with(
            StorageConfig::new(dir.path(), "http://localhost:4000/files").with_policy(policy),
        );
        std::fs::write(dir.path().join("taken"), b"not a directory").unwrap();

        let result = placer
            .upload(pdf_blob("a.pdf"), Some("taken/inner"), &ClientInfo::default())
            .await;

        assert_eq!(result.error_code, Some(UploadErrorKind::DirectoryCreateFailed));
        let message = result.error_message.unwrap();
        assert!(message.contains("taken/inner"));
        assert!(!message.contains(&*dir.path().to_string_lossy()));
    }

    #[tokio::test]
    async fn test_delete_list_stat() {
        let (_dir, placer) = test_placer();
        let result = placer
            .upload(pdf_blob("a.pdf"), None, &ClientInfo::default())
            .await;
        let key = result.storage_key.unwrap();

        let files = placer.list(None).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, key);

        let stat = placer.stat(&key).await.unwrap();
        assert!(stat.exists);

        assert_eq!(placer.delete(&key).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(
            placer.delete("nonexistent/key.pdf").await.unwrap(),
            DeleteOutcome::NotFound
        );
        assert!(!placer.stat(&key).await.unwrap().exists);
    }

    #[tokio::test]
    async fn test_prepare_refreshes_guard_when_configured() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".htaccess"), b"stale").unwrap();

        let placer = placer_with(StorageConfig::new(dir.path(), "http://localhost:4000/files"));
        placer.prepare().await.unwrap();
        let guard = std::fs::read_to_string(placer.directory().guard_path()).unwrap();
        assert_eq!(guard, "stale");

        let mut config = StorageConfig::new(dir.path(), "http://localhost:4000/files");
        config.refresh_guard_on_startup = true;
        let placer = placer_with(config);
        placer.prepare().await.unwrap();
        let guard = std::fs::read_to_string(placer.directory().guard_path()).unwrap();
        assert!(guard.contains("Deny from all"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_uploads_get_distinct_keys() {
        let (_dir, placer) = test_placer();
        let placer = Arc::new(placer);

        let tasks: Vec<_> = (0..24)
            .map(|_| {
                let placer = placer.clone();
                tokio::spawn(async move {
                    placer
                        .upload(pdf_blob("same.pdf"), None, &ClientInfo::default())
                        .await
                })
            })
            .collect();

        let mut keys = HashSet::new();
        for task in tasks {
            let result = task.await.unwrap();
            assert!(result.success, "{:?}", result);
            keys.insert(result.storage_key.unwrap());
        }
        assert_eq!(keys.len(), 24);

        let raw = std::fs::read_to_string(placer.upload_log().path()).unwrap();
        assert_eq!(raw.lines().count(), 24);
        for line in raw.lines() {
            let entry: UploadLogEntry = serde_json::from_str(line).unwrap();
            assert!(keys.contains(&entry.stored_key));
        }
    }
}
