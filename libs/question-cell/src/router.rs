use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers::*;

pub fn create_question_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list_questions).post(create_question))
        .route("/seed/malaria", post(seed_malaria_questions))
        // `{id}` holds the disease name on step lookups.
        .route("/{id}/step/{step}", get(get_question_by_step))
        .route(
            "/{id}",
            get(get_question).put(update_question).delete(delete_question),
        )
        .with_state(state)
}
