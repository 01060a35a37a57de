use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers::*;

pub fn create_doctor_queue_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(add_to_queue))
        .route("/admit", post(admit_from_report))
        .route("/doctor/{doctor_id}", get(get_doctor_queue))
        .route("/doctor/{doctor_id}/clear", delete(clear_doctor_queue))
        .route("/hospital/{hospital_id}", get(get_hospital_queue))
        .route("/position/{patient_user_id}/{doctor_id}", get(get_queue_position))
        .route("/{queue_id}", get(get_queue_entry).delete(remove_from_queue))
        .route("/{queue_id}/priority", patch(update_priority))
        .with_state(state)
}
