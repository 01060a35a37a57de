use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::info;

use shared_config::{AppConfig, StoreBackend};
use shared_database::{InMemoryStore, RecordStore, SupabaseClient, UniqueIndex};

/// Every unique index the cells rely on. The in-memory store enforces these
/// directly; the Supabase schema declares constraints with the same names.
pub fn unique_indexes() -> Vec<UniqueIndex> {
    let mut indexes = patient_cell::unique_indexes();
    indexes.extend(hospital_patient_cell::unique_indexes());
    indexes.extend(doctor_queue_cell::unique_indexes());
    indexes.extend(question_cell::unique_indexes());
    indexes
}

pub fn build_store(config: &AppConfig) -> Result<Arc<dyn RecordStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            info!("Using in-memory record store");
            Ok(Arc::new(InMemoryStore::new(unique_indexes())))
        }
        StoreBackend::Supabase => {
            if !config.is_supabase_configured() {
                bail!("STORE_BACKEND=supabase requires SUPABASE_URL and SUPABASE_SERVICE_KEY");
            }
            let client = SupabaseClient::new(config);
            info!("Using Supabase record store at {}", client.get_base_url());
            Ok(Arc::new(client))
        }
    }
}
