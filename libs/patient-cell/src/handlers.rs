use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::AppError;
use shared_utils::AppState;

use crate::models::{CreatePatientRequest, PatientSearchQuery, UpdatePatientRequest};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(state.store.clone());

    let patient = service.create_patient(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient created successfully",
        "data": patient
    })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(state.store.clone());

    let patient = service.get_patient(&patient_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient retrieved successfully",
        "data": patient
    })))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(state.store.clone());

    let patient = service.update_patient(&patient_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient updated successfully",
        "data": patient
    })))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(state.store.clone());

    service.delete_patient(&patient_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient deleted successfully"
    })))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(state.store.clone());

    let patients = service.search_patients(query).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patients retrieved successfully",
        "count": patients.len(),
        "data": patients
    })))
}
