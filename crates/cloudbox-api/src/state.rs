//! Application state shared by all handlers.

use std::sync::Arc;

use cloudbox_core::Config;
use cloudbox_processing::Placer;
use cloudbox_storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub placer: Arc<Placer>,
    pub storage: Arc<dyn Storage>,
    pub is_production: bool,
}

impl AppState {
    pub fn new(config: Config, placer: Arc<Placer>) -> Self {
        let storage = placer.storage().clone();
        let is_production = config.is_production();
        Self {
            config,
            placer,
            storage,
            is_production,
        }
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
