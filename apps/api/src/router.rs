use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use doctor_queue_cell::create_doctor_queue_router;
use hospital_cell::create_hospital_router;
use hospital_patient_cell::create_hospital_patient_router;
use patient_cell::create_patient_router;
use question_cell::create_question_router;
use shared_utils::AppState;
use triage_cell::{create_triage_router, TriageClassifier};

pub fn create_router(state: Arc<AppState>, classifier: Arc<dyn TriageClassifier>) -> Router {
    Router::new()
        .route("/", get(|| async { "Hospital Intake API is running!" }))
        .route("/health", get(health))
        .nest("/hospitals", create_hospital_router(state.clone()))
        .nest("/patients", create_patient_router(state.clone()))
        .nest("/hospital-patient", create_hospital_patient_router(state.clone()))
        .nest("/queue", create_doctor_queue_router(state.clone()))
        .nest("/questions", create_question_router(state.clone()))
        .merge(create_triage_router(state, classifier))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
