use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers::*;

pub fn create_hospital_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(create_hospital).get(list_hospitals))
        .route(
            "/{id}",
            get(get_hospital).put(update_hospital).delete(delete_hospital),
        )
        .route("/{id}/doctors", post(create_doctor).get(list_doctors))
        .route(
            "/{id}/doctors/{doctor_id}",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
        .with_state(state)
}
