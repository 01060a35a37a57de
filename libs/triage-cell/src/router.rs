use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers::*;
use crate::services::TriageClassifier;

/// Handler state: shared application state plus the classifier in use.
#[derive(Clone)]
pub struct TriageState {
    pub app: Arc<AppState>,
    pub classifier: Arc<dyn TriageClassifier>,
}

/// Routes are absolute (`/diagnosis`, `/diagnosis-reports/...`) and meant to
/// be merged at the root.
pub fn create_triage_router(state: Arc<AppState>, classifier: Arc<dyn TriageClassifier>) -> Router {
    let state = TriageState { app: state, classifier };

    Router::new()
        .route("/diagnosis", post(submit_diagnosis))
        .route("/diagnosis-reports", post(create_report))
        .route("/diagnosis-reports/{id}", get(get_report))
        .route("/diagnosis-reports/{id}/feedback", patch(update_feedback))
        .route("/diagnosis-reports/patient/{patient_user_id}", get(list_patient_reports))
        .with_state(state)
}
