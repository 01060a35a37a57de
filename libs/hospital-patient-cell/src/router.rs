use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers::*;

pub fn create_hospital_patient_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/join-hospital", post(join_hospital))
        .route("/join-queue", post(join_queue))
        .route("/queue/position", get(get_queue_position))
        .route("/hospital/{hospital_id}/patients", get(get_hospital_patients))
        .route("/hospital/{hospital_id}/queue", get(get_hospital_queue))
        .route("/{patient_code}", get(get_by_patient_code))
        .with_state(state)
}
