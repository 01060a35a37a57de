use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::{StoreError, UniqueIndex};
use shared_models::{AppError, ErrorKind};
use shared_utils::ReferenceError;

pub const PATIENTS: &str = "patients";

pub const PATIENT_EMAIL_KEY: UniqueIndex =
    UniqueIndex::new("patients_email_key", PATIENTS, &["email"]);

/// Unique indexes the patient collection relies on.
pub fn unique_indexes() -> Vec<UniqueIndex> {
    vec![PATIENT_EMAIL_KEY]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    #[serde(default)]
    pub medical_history: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    #[serde(default)]
    pub medical_history: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub medical_history: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientSearchQuery {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Patient with email {email} already exists")]
    EmailAlreadyExists { email: String },

    #[error(transparent)]
    InvalidReference(#[from] ReferenceError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] StoreError),
}

impl PatientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PatientError::NotFound(_) => ErrorKind::NotFound,
            PatientError::EmailAlreadyExists { .. } => ErrorKind::Conflict,
            PatientError::InvalidReference(_) | PatientError::ValidationError(_) => {
                ErrorKind::InvalidArgument
            }
            PatientError::DatabaseError(e) => e.kind(),
        }
    }
}

impl From<PatientError> for AppError {
    fn from(e: PatientError) -> Self {
        AppError::from_kind(e.kind(), e.to_string())
    }
}
