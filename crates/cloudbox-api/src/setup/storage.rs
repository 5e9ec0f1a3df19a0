//! Storage setup and initialization

use std::sync::Arc;

use anyhow::{Context, Result};
use cloudbox_core::Config;
use cloudbox_processing::Placer;
use cloudbox_storage::{LocalStorage, Storage};

/// Build the local store and the upload pipeline on top of it.
///
/// Materializes the store root and its guard file up front so a broken
/// storage path fails start-up instead of the first upload.
pub async fn setup_storage(config: &Config) -> Result<Arc<Placer>> {
    let storage_config = Arc::new(config.storage().clone());

    tracing::info!(
        root_path = %storage_config.root_path().display(),
        public_base_url = %storage_config.public_base_url,
        storage_enabled = storage_config.storage_enabled,
        "Initializing local storage"
    );

    let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(
        storage_config.root_path(),
        storage_config.public_base_url.clone(),
    ));
    let placer = Placer::new(storage_config.clone(), storage);

    if storage_config.storage_enabled {
        placer
            .prepare()
            .await
            .context("Failed to prepare storage root")?;
        tracing::info!(
            guard_path = %placer.directory().guard_path().display(),
            "Storage root ready"
        );
    }

    Ok(Arc::new(placer))
}
