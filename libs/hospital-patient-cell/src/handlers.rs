use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::AppError;
use shared_utils::AppState;

use crate::models::{JoinHospitalRequest, JoinQueueRequest, QueuePositionQuery};
use crate::services::{EnrollmentLedger, WaitQueue};

fn ledger(state: &AppState) -> EnrollmentLedger {
    EnrollmentLedger::new(state.store.clone(), state.config.patient_code_max_attempts)
}

fn wait_queue(state: &AppState) -> WaitQueue {
    WaitQueue::new(
        state.store.clone(),
        ledger(state),
        state.config.order_assignment_max_retries,
    )
}

#[axum::debug_handler]
pub async fn join_hospital(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinHospitalRequest>,
) -> Result<Json<Value>, AppError> {
    let record = ledger(&state).enroll(&request.hospital_id, &request.phone).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Joined hospital successfully",
        "data": record
    })))
}

#[axum::debug_handler]
pub async fn join_queue(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinQueueRequest>,
) -> Result<Json<Value>, AppError> {
    let entry = wait_queue(&state)
        .join(&request.hospital_id, &request.patient_code, &request.full_name)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Joined queue successfully",
        "data": entry
    })))
}

#[axum::debug_handler]
pub async fn get_by_patient_code(
    State(state): State<Arc<AppState>>,
    Path(patient_code): Path<String>,
) -> Result<Json<Value>, AppError> {
    let patient = ledger(&state).lookup_with_hospital(&patient_code).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Patient retrieved successfully",
        "data": patient
    })))
}

#[axum::debug_handler]
pub async fn get_hospital_patients(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let records = ledger(&state).list_for_hospital(&hospital_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Hospital patients retrieved successfully",
        "count": records.len(),
        "data": records
    })))
}

#[axum::debug_handler]
pub async fn get_hospital_queue(
    State(state): State<Arc<AppState>>,
    Path(hospital_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let entries = wait_queue(&state).list_waiting(&hospital_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Hospital queue retrieved successfully",
        "count": entries.len(),
        "data": entries
    })))
}

#[axum::debug_handler]
pub async fn get_queue_position(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QueuePositionQuery>,
) -> Result<Json<Value>, AppError> {
    let position = wait_queue(&state)
        .position(&query.patient_code, &query.hospital_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Queue position retrieved successfully",
        "data": position
    })))
}
