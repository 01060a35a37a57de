use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers::*;

pub fn create_patient_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(create_patient))
        .route("/search", get(search_patients))
        .route(
            "/{id}",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
        .with_state(state)
}
