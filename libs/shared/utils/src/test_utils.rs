use std::sync::Arc;

use shared_config::{AppConfig, StoreBackend};
use shared_database::{InMemoryStore, UniqueIndex};

use crate::state::AppState;

pub struct TestConfig {
    pub average_consultation_minutes: u32,
    pub order_assignment_max_retries: u32,
    pub patient_code_max_attempts: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            average_consultation_minutes: 15,
            order_assignment_max_retries: 10,
            patient_code_max_attempts: 20,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_backend: StoreBackend::Memory,
            average_consultation_minutes: self.average_consultation_minutes,
            order_assignment_max_retries: self.order_assignment_max_retries,
            patient_code_max_attempts: self.patient_code_max_attempts,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    /// In-memory state with the given unique indexes enforced. The concrete
    /// store is returned too so tests can simulate outages.
    pub fn memory_state(&self, indexes: Vec<UniqueIndex>) -> (Arc<AppState>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new(indexes));
        let state = AppState::new(self.to_app_config(), store.clone());
        (Arc::new(state), store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default().to_app_config();

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.average_consultation_minutes, 15);
        assert!(!config.is_supabase_configured());
    }

    #[test]
    fn memory_state_shares_one_store() {
        let (state, store) = TestConfig::default().memory_state(Vec::new());
        assert_eq!(Arc::strong_count(&store), 2);
        assert_eq!(state.config.port, 3000);
    }
}
