use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::AppError;
use shared_utils::AppState;

use crate::models::{
    CreateDoctorRequest, CreateHospitalRequest, UpdateDoctorRequest, UpdateHospitalRequest,
};
use crate::services::HospitalDirectory;

#[axum::debug_handler]
pub async fn create_hospital(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateHospitalRequest>,
) -> Result<Json<Value>, AppError> {
    let directory = HospitalDirectory::new(state.store.clone());

    let hospital = directory.create_hospital(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Hospital created successfully",
        "data": hospital
    })))
}

#[axum::debug_handler]
pub async fn list_hospitals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let directory = HospitalDirectory::new(state.store.clone());

    let hospitals = directory.list_hospitals().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Hospitals retrieved successfully",
        "count": hospitals.len(),
        "data": hospitals
    })))
}

#[axum::debug_handler]
pub async fn get_hospital(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let directory = HospitalDirectory::new(state.store.clone());

    let hospital = directory.get_hospital(&hospital_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Hospital retrieved successfully",
        "data": hospital
    })))
}

#[axum::debug_handler]
pub async fn update_hospital(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
    Json(request): Json<UpdateHospitalRequest>,
) -> Result<Json<Value>, AppError> {
    let directory = HospitalDirectory::new(state.store.clone());

    let hospital = directory.update_hospital(&hospital_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Hospital updated successfully",
        "data": hospital
    })))
}

#[axum::debug_handler]
pub async fn delete_hospital(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let directory = HospitalDirectory::new(state.store.clone());

    directory.delete_hospital(&hospital_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Hospital deleted successfully"
    })))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let directory = HospitalDirectory::new(state.store.clone());

    let doctor = directory.create_doctor(&hospital_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor added successfully",
        "data": doctor
    })))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let directory = HospitalDirectory::new(state.store.clone());

    let doctors = directory.list_doctors(&hospital_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctors retrieved successfully",
        "count": doctors.len(),
        "data": doctors
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppState>>,
    Path((hospital_id, doctor_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let directory = HospitalDirectory::new(state.store.clone());

    let doctor = directory.get_doctor(&hospital_id, &doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor retrieved successfully",
        "data": doctor
    })))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppState>>,
    Path((hospital_id, doctor_id)): Path<(String, String)>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let directory = HospitalDirectory::new(state.store.clone());

    let doctor = directory.update_doctor(&hospital_id, &doctor_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor updated successfully",
        "data": doctor
    })))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(state): State<Arc<AppState>>,
    Path((hospital_id, doctor_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let directory = HospitalDirectory::new(state.store.clone());

    directory.delete_doctor(&hospital_id, &doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor removed successfully"
    })))
}
