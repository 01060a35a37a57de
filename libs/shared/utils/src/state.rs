use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::RecordStore;

/// Shared handler state: configuration plus the single record store every
/// cell reads and writes through.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
