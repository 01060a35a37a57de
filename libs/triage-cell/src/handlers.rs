use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::AppError;

use crate::models::{CreateDiagnosisReportRequest, SubmitDiagnosisRequest, UpdateFeedbackRequest};
use crate::router::TriageState;
use crate::services::{DiagnosisReportService, TriageService};

fn reports(state: &TriageState) -> DiagnosisReportService {
    DiagnosisReportService::new(state.app.store.clone())
}

#[axum::debug_handler]
pub async fn submit_diagnosis(
    State(state): State<TriageState>,
    Json(request): Json<SubmitDiagnosisRequest>,
) -> Result<Json<Value>, AppError> {
    let service = TriageService::new(state.classifier.clone(), reports(&state));

    let outcome = service.submit(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Diagnosis completed successfully",
        "data": outcome
    })))
}

#[axum::debug_handler]
pub async fn create_report(
    State(state): State<TriageState>,
    Json(request): Json<CreateDiagnosisReportRequest>,
) -> Result<Json<Value>, AppError> {
    let report = reports(&state).create_report(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Diagnosis report created successfully",
        "data": report
    })))
}

#[axum::debug_handler]
pub async fn get_report(
    State(state): State<TriageState>,
    Path(report_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let report = reports(&state).get_report(&report_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Diagnosis report retrieved successfully",
        "data": report
    })))
}

#[axum::debug_handler]
pub async fn list_patient_reports(
    State(state): State<TriageState>,
    Path(patient_user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let found = reports(&state).list_for_patient(&patient_user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Diagnosis reports retrieved successfully",
        "count": found.len(),
        "data": found
    })))
}

#[axum::debug_handler]
pub async fn update_feedback(
    State(state): State<TriageState>,
    Path(report_id): Path<String>,
    Json(request): Json<UpdateFeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    let report = reports(&state).update_feedback(&report_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor feedback updated successfully",
        "data": report
    })))
}
