//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use cloudbox_core::constants::{EXECUTABLE_EXTENSIONS, SCRIPT_EXTENSIONS};
use cloudbox_core::Config;

/// Validate critical configuration values
///
/// Hard errors for settings that would make the service unsafe or unusable,
/// warnings for settings that are legal but deserve an operator's attention.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    if is_production && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production. \
            Please set specific allowed origins via CORS_ORIGINS environment variable."
        ));
    }

    if config.trusted_proxy_count() > 10 {
        tracing::warn!(
            trusted_proxy_count = config.trusted_proxy_count(),
            "TRUSTED_PROXY_COUNT is very high - ensure this matches your actual proxy setup"
        );
    }

    let storage = config.storage();
    if !storage.storage_enabled {
        tracing::warn!("STORAGE_ENABLED is false - all uploads will be refused");
    }

    let executable: Vec<&str> = EXECUTABLE_EXTENSIONS
        .iter()
        .chain(SCRIPT_EXTENSIONS)
        .copied()
        .filter(|ext| config.policy().allows_extension(ext))
        .collect();
    if !executable.is_empty() {
        if is_production && storage.serve_files {
            tracing::warn!(
                extensions = %executable.join(","),
                "Executable or script extensions are allowed and served publicly"
            );
        } else {
            tracing::warn!(
                extensions = %executable.join(","),
                "Executable or script extensions are allowed"
            );
        }
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}
