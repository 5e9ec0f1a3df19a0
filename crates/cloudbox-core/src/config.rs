//! Configuration module
//!
//! This module provides the configuration structures for the API and the
//! upload pipeline: server settings, the store location and the immutable
//! upload policy. Everything is read once at start-up and shared read-only.

use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};

use crate::constants;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_FILE_SIZE_MB: u64 = 50;
const TRUSTED_PROXY_COUNT: usize = 1;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
const STORAGE_ROOT_PATH: &str = "./files";
const UPLOAD_FIELD_NAME: &str = "file";

/// Server-level configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub trusted_proxy_count: usize,
    pub http_concurrency_limit: usize,
    /// `text` or `json`
    pub log_format: String,
}

/// Validation and placement policy for uploads.
///
/// Extensions and MIME types are kept lower-cased in ordered sets so that
/// anything rendered from them (guard file, error messages) is stable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyConfig {
    pub max_size_bytes: u64,
    pub allowed_extensions: BTreeSet<String>,
    pub allowed_mime_types: BTreeSet<String>,
    pub use_timestamp: bool,
    pub use_random_suffix: bool,
    pub organize_by_date: bool,
}

impl PolicyConfig {
    pub fn new<E, M>(max_size_bytes: u64, allowed_extensions: E, allowed_mime_types: M) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        Self {
            max_size_bytes,
            allowed_extensions: normalize_set(allowed_extensions),
            allowed_mime_types: normalize_set(allowed_mime_types),
            use_timestamp: true,
            use_random_suffix: true,
            organize_by_date: true,
        }
    }

    pub fn with_naming(
        mut self,
        use_timestamp: bool,
        use_random_suffix: bool,
        organize_by_date: bool,
    ) -> Self {
        self.use_timestamp = use_timestamp;
        self.use_random_suffix = use_random_suffix;
        self.organize_by_date = organize_by_date;
        self
    }

    pub fn allows_extension(&self, extension: &str) -> bool {
        self.allowed_extensions
            .contains(extension.to_lowercase().as_str())
    }

    pub fn allows_mime_type(&self, mime_type: &str) -> bool {
        self.allowed_mime_types
            .contains(mime_type.to_lowercase().as_str())
    }

    /// Size cap as shown in messages, e.g. `50MB`.
    pub fn max_size_display(&self) -> String {
        constants::human_readable_size(self.max_size_bytes)
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::new(
            MAX_FILE_SIZE_MB * 1024 * 1024,
            constants::default_extensions(),
            constants::default_mime_types(),
        )
    }
}

/// Store location and upload behavior
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub storage_enabled: bool,
    pub root_path: PathBuf,
    pub public_base_url: String,
    pub log_uploads: bool,
    /// Rewrite the guard file at start-up instead of keeping the one written at creation.
    pub refresh_guard_on_startup: bool,
    pub serve_files: bool,
    pub upload_field_name: String,
    pub policy: PolicyConfig,
}

impl StorageConfig {
    /// Storage settings rooted at `root_path` with the default policy.
    pub fn new(root_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            storage_enabled: true,
            root_path: root_path.into(),
            public_base_url: public_base_url.into(),
            log_uploads: true,
            refresh_guard_on_startup: false,
            serve_files: true,
            upload_field_name: UPLOAD_FIELD_NAME.to_string(),
            policy: PolicyConfig::default(),
        }
    }

    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Public URL of a stored object.
    pub fn public_url(&self, storage_key: &str) -> String {
        format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            storage_key
        )
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.policy.max_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.policy.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }

        if self.policy.allowed_mime_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_MIME_TYPES must not be empty"));
        }

        if !self.public_base_url.starts_with("http://")
            && !self.public_base_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "PUBLIC_BASE_URL must start with http:// or https://"
            ));
        }

        if self.upload_field_name.trim().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_FIELD_NAME must not be empty"));
        }

        Ok(())
    }
}

/// Full application configuration
#[derive(Clone, Debug)]
pub struct CloudboxConfig {
    pub base: BaseConfig,
    pub storage: StorageConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<CloudboxConfig>);

impl Config {
    pub fn new(base: BaseConfig, storage: StorageConfig) -> Self {
        Config(Box::new(CloudboxConfig { base, storage }))
    }

    fn inner(&self) -> &CloudboxConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let base = BaseConfig {
            server_port,
            cors_origins: split_list(&cors_origins_str, false),
            environment,
            trusted_proxy_count: env::var("TRUSTED_PROXY_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(TRUSTED_PROXY_COUNT),
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .to_lowercase(),
        };

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allow_executables = env_bool("ALLOW_EXECUTABLES", false);

        let mut allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .map(|s| split_list(&s, true))
            .unwrap_or_else(|_| constants::default_extensions());
        let mut allowed_mime_types = env::var("ALLOWED_MIME_TYPES")
            .map(|s| split_list(&s, true))
            .unwrap_or_else(|_| constants::default_mime_types());
        if allow_executables {
            allowed_extensions.extend(constants::executable_extensions());
            allowed_mime_types.extend(constants::executable_mime_types());
        }

        let policy = PolicyConfig::new(
            max_file_size_mb * 1024 * 1024,
            allowed_extensions,
            allowed_mime_types,
        )
        .with_naming(
            env_bool("USE_TIMESTAMP", true),
            env_bool("USE_RANDOM_SUFFIX", true),
            env_bool("ORGANIZE_BY_DATE", true),
        );

        let storage = StorageConfig {
            storage_enabled: env_bool("STORAGE_ENABLED", true),
            root_path: env::var("STORAGE_ROOT_PATH")
                .unwrap_or_else(|_| STORAGE_ROOT_PATH.to_string())
                .into(),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/files/", server_port)),
            log_uploads: env_bool("LOG_UPLOADS", true),
            refresh_guard_on_startup: env_bool("REFRESH_GUARD_ON_STARTUP", false),
            serve_files: env_bool("SERVE_FILES", true),
            upload_field_name: env::var("UPLOAD_FIELD_NAME")
                .unwrap_or_else(|_| UPLOAD_FIELD_NAME.to_string()),
            policy,
        };

        let config = Config::new(base, storage);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.inner().base.server_port == 0 {
            return Err(anyhow::anyhow!("PORT must be greater than 0"));
        }
        self.inner().storage.validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn trusted_proxy_count(&self) -> usize {
        self.inner().base.trusted_proxy_count
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().base.http_concurrency_limit
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.inner().storage
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.inner().storage.policy
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.inner().storage.policy.max_size_bytes
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .to_lowercase()
        .parse()
        .unwrap_or(default)
}

/// Split a comma separated list, trimming entries and dropping empty ones.
fn split_list(value: &str, lowercase: bool) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            if lowercase {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        })
        .collect()
}

fn normalize_set<I>(items: I) -> BTreeSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
