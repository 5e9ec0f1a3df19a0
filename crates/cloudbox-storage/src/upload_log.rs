//! Append-only upload audit log (`upload_log.txt`, one JSON object per line).

use std::io;
use std::path::{Path, PathBuf};

use cloudbox_core::constants::UPLOAD_LOG_FILE_NAME;
use cloudbox_core::models::UploadLogEntry;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Serializes appends from every request of the process.
///
/// Each record is written with a single `write_all` on a file opened in
/// append mode while the lock is held.
#[derive(Debug)]
pub struct UploadLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl UploadLog {
    /// Log living in the store root.
    pub fn in_root(root: &Path) -> Self {
        Self::new(root.join(UPLOAD_LOG_FILE_NAME))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, entry: &UploadLogEntry) -> io::Result<()> {
        let mut line = serde_json::to_vec(entry).map_err(io::Error::other)?;
        line.push(b'\n');

        let _guard = self.lock.lock().await;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        Ok(())
    }

    /// Parse every record; malformed lines are skipped.
    pub async fn read_entries(&self) -> io::Result<Vec<UploadLogEntry>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(contents
            .lines()
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed upload log line");
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudbox_core::models::ClientInfo;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_append_writes_json_lines() {
        let dir = tempdir().unwrap();
        let log = UploadLog::in_root(dir.path());
        let client = ClientInfo::new("203.0.113.7", "curl/8.0");

        log.append(&UploadLogEntry::new("a.pdf", "2024/01/15/a.pdf", &client))
            .await
            .unwrap();
        log.append(&UploadLogEntry::new("b.png", "b.png", &client))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join("upload_log.txt")).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.ends_with('\n'));

        let entries = log.read_entries().await.unwrap();
        assert_eq!(entries[0].original_name, "a.pdf");
        assert_eq!(entries[0].ip_address, "203.0.113.7");
        assert_eq!(entries[1].stored_key, "b.png");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = tempdir().unwrap();
        let log = Arc::new(UploadLog::in_root(dir.path()));

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let log = log.clone();
                tokio::spawn(async move {
                    let name = format!("{}-{}.pdf", i, "x".repeat(512));
                    log.append(&UploadLogEntry::new(&name, &name, &ClientInfo::default()))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw.lines().count(), 32);
        for line in raw.lines() {
            let entry: UploadLogEntry = serde_json::from_str(line).unwrap();
            assert!(entry.original_name.ends_with(".pdf"));
        }
    }

    #[tokio::test]
    async fn test_missing_log_reads_empty() {
        let dir = tempdir().unwrap();
        let log = UploadLog::in_root(dir.path());
        assert!(log.read_entries().await.unwrap().is_empty());
    }
}
