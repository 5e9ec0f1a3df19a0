//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded [`Config`] to a running router.

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use anyhow::{Context, Result};
use cloudbox_core::Config;
use cloudbox_infra::LogFormat;

use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let log_format = config
        .log_format()
        .parse::<LogFormat>()
        .map_err(|e| anyhow::anyhow!("Invalid LOG_FORMAT: {}", e))?;
    cloudbox_infra::init_telemetry(config.environment(), log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    validation::validate_config(&config).context("Configuration validation failed")?;
    tracing::info!("Configuration loaded and validated successfully");

    build_app(config).await
}

/// Build state and router without touching global tracing state.
pub async fn build_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let placer = storage::setup_storage(&config).await?;
    let state = Arc::new(AppState::new(config.clone(), placer));
    let router = routes::setup_routes(&config, state.clone())?;
    Ok((state, router))
}
