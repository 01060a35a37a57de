use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::AppError;
use shared_utils::AppState;

use crate::models::{AdmitRequest, EnqueueRequest, UpdatePriorityRequest};
use crate::services::DoctorQueue;

fn doctor_queue(state: &AppState) -> DoctorQueue {
    DoctorQueue::new(state.store.clone(), &state.config)
}

#[axum::debug_handler]
pub async fn add_to_queue(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnqueueRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = doctor_queue(&state).enqueue(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient added to queue successfully",
        "data": entry
    })))
}

#[axum::debug_handler]
pub async fn admit_from_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdmitRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = doctor_queue(&state).admit_from_report(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient admitted to queue successfully",
        "data": entry
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_queue(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let entries = doctor_queue(&state).list_for_doctor(&doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor queue retrieved successfully",
        "count": entries.len(),
        "data": entries
    })))
}

#[axum::debug_handler]
pub async fn get_hospital_queue(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let entries = doctor_queue(&state).list_for_hospital(&hospital_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Hospital queue retrieved successfully",
        "count": entries.len(),
        "data": entries
    })))
}

#[axum::debug_handler]
pub async fn get_queue_entry(
    State(state): State<Arc<AppState>>,
    Path(queue_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let view = doctor_queue(&state).get_by_id(&queue_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Queue entry retrieved successfully",
        "data": view
    })))
}

#[axum::debug_handler]
pub async fn get_queue_position(
    State(state): State<Arc<AppState>>,
    Path((patient_user_id, doctor_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let report = doctor_queue(&state).position(&patient_user_id, &doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Queue position retrieved successfully",
        "data": report
    })))
}

#[axum::debug_handler]
pub async fn update_priority(
    State(state): State<Arc<AppState>>,
    Path(queue_id): Path<String>,
    Json(request): Json<UpdatePriorityRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = doctor_queue(&state)
        .update_priority(&queue_id, request.priority_level)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Queue priority updated successfully",
        "data": entry
    })))
}

#[axum::debug_handler]
pub async fn remove_from_queue(
    State(state): State<Arc<AppState>>,
    Path(queue_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    doctor_queue(&state).remove(&queue_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient removed from queue successfully"
    })))
}

#[axum::debug_handler]
pub async fn clear_doctor_queue(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let cleared = doctor_queue(&state).clear(&doctor_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Cleared {} entries from queue", cleared.deleted_count),
        "data": cleared
    })))
}
