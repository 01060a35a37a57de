use thiserror::Error;

use shared_database::StoreError;
use shared_models::{AppError, ErrorKind};
use shared_utils::ReferenceError;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error(transparent)]
    InvalidReference(#[from] ReferenceError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Disease \"{disease}\" is not currently supported. Available: {supported}")]
    UnsupportedDisease { disease: String, supported: String },

    #[error("AI service is not configured. Missing GEMINI_API_KEY")]
    ClassifierNotConfigured,

    #[error("AI service error: {0}")]
    ClassifierUnavailable(String),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl TriageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TriageError::InvalidReference(_)
            | TriageError::ValidationError(_)
            | TriageError::UnsupportedDisease { .. } => ErrorKind::InvalidArgument,
            TriageError::ReportNotFound(_) => ErrorKind::NotFound,
            TriageError::ClassifierNotConfigured | TriageError::ClassifierUnavailable(_) => {
                ErrorKind::Unavailable
            }
            TriageError::Store(e) => e.kind(),
        }
    }
}

impl From<reqwest::Error> for TriageError {
    fn from(err: reqwest::Error) -> Self {
        TriageError::ClassifierUnavailable(format!("Failed to analyze symptoms: {}", err))
    }
}

impl From<TriageError> for AppError {
    fn from(e: TriageError) -> Self {
        AppError::from_kind(e.kind(), e.to_string())
    }
}
