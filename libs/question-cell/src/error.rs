use thiserror::Error;

use shared_database::StoreError;
use shared_models::{AppError, ErrorKind};
use shared_utils::ReferenceError;

#[derive(Error, Debug)]
pub enum QuestionError {
    #[error(transparent)]
    InvalidReference(#[from] ReferenceError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Question with ID {0} not found")]
    QuestionNotFound(String),

    #[error("No active {disease} question at step {step}")]
    StepNotFound { disease: String, step: String },

    #[error("{disease} already has a question at step {step_number}")]
    StepTaken { disease: String, step_number: u32 },

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl QuestionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuestionError::InvalidReference(_) | QuestionError::ValidationError(_) => {
                ErrorKind::InvalidArgument
            }
            QuestionError::QuestionNotFound(_) | QuestionError::StepNotFound { .. } => {
                ErrorKind::NotFound
            }
            QuestionError::StepTaken { .. } => ErrorKind::Conflict,
            QuestionError::Store(e) => e.kind(),
        }
    }
}

impl From<QuestionError> for AppError {
    fn from(e: QuestionError) -> Self {
        AppError::from_kind(e.kind(), e.to_string())
    }
}
