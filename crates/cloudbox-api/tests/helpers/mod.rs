//! Test helpers: build the real router over a temporary local store.
//!
//! Run from workspace root: `cargo test -p cloudbox-api`.

pub mod fixtures;

use std::path::{Path, PathBuf};

use axum_test::TestServer;
use cloudbox_api::constants;
use cloudbox_api::setup;
use cloudbox_core::{BaseConfig, Config, PolicyConfig, StorageConfig};
use tempfile::TempDir;

pub const TEST_PUBLIC_BASE_URL: &str = "http://localhost:4000/files/";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server and the store it writes to.
pub struct TestApp {
    pub server: TestServer,
    pub root: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lines of the upload log, empty when no upload was logged.
    pub fn log_lines(&self) -> Vec<serde_json::Value> {
        std::fs::read_to_string(self.root.join("upload_log.txt"))
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).expect("log line is JSON"))
            .collect()
    }
}

pub fn test_base_config() -> BaseConfig {
    BaseConfig {
        server_port: 4000,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        trusted_proxy_count: 1,
        http_concurrency_limit: 100,
        log_format: "text".to_string(),
    }
}

/// Setup test app with the default policy.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup test app, letting the caller adjust the storage settings first.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut StorageConfig)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let root = temp_dir.path().join("files");

    let mut storage = StorageConfig::new(&root, TEST_PUBLIC_BASE_URL);
    customize(&mut storage);

    let config = Config::new(test_base_config(), storage);
    let (_state, router) = setup::build_app(config)
        .await
        .expect("Failed to build app");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        root,
        _temp_dir: temp_dir,
    }
}

/// Small policy for size limit tests: 1MB cap, pdf/png/txt only.
pub fn small_policy() -> PolicyConfig {
    PolicyConfig::new(
        1024 * 1024,
        ["pdf", "png", "txt"],
        ["application/pdf", "image/png", "text/plain"],
    )
}
