use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::AppError;
use shared_utils::AppState;

use crate::models::{CreateQuestionRequest, QuestionQuery, UpdateQuestionRequest};
use crate::services::QuestionBank;

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuestionQuery>,
) -> Result<Json<Value>, AppError> {
    let bank = QuestionBank::new(state.store.clone());

    let questions = match query.disease.as_deref().map(str::trim) {
        Some(disease) if !disease.is_empty() => bank.find_by_disease(disease).await?,
        _ => bank.list_questions().await?,
    };

    Ok(Json(json!({
        "success": true,
        "message": "Questions retrieved successfully",
        "count": questions.len(),
        "data": questions
    })))
}

#[axum::debug_handler]
pub async fn get_question_by_step(
    State(state): State<Arc<AppState>>,
    Path((disease, step)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let bank = QuestionBank::new(state.store.clone());

    let question = bank.get_step(&disease, &step).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Question retrieved successfully",
        "data": question
    })))
}

#[axum::debug_handler]
pub async fn seed_malaria_questions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let bank = QuestionBank::new(state.store.clone());

    let outcome = bank.seed_malaria().await?;

    Ok(Json(json!({
        "success": true,
        "message": outcome.message,
        "count": outcome.count
    })))
}

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<Json<Value>, AppError> {
    let bank = QuestionBank::new(state.store.clone());

    let question = bank.create_question(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Question created successfully",
        "data": question
    })))
}

#[axum::debug_handler]
pub async fn get_question(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let bank = QuestionBank::new(state.store.clone());

    let question = bank.get_question(&question_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Question retrieved successfully",
        "data": question
    })))
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<String>,
    Json(request): Json<UpdateQuestionRequest>,
) -> Result<Json<Value>, AppError> {
    let bank = QuestionBank::new(state.store.clone());

    let question = bank.update_question(&question_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Question updated successfully",
        "data": question
    })))
}

#[axum::debug_handler]
pub async fn delete_question(
    State(state): State<Arc<AppState>>,
    Path(question_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let bank = QuestionBank::new(state.store.clone());

    bank.delete_question(&question_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Question deleted successfully"
    })))
}
