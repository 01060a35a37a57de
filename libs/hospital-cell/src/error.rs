use thiserror::Error;

use shared_database::StoreError;
use shared_models::{AppError, ErrorKind};
use shared_utils::ReferenceError;

#[derive(Error, Debug)]
pub enum HospitalError {
    #[error(transparent)]
    InvalidReference(#[from] ReferenceError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Hospital not found: {0}")]
    HospitalNotFound(String),

    #[error("Doctor {doctor_id} not found at hospital {hospital_id}")]
    DoctorNotFound { hospital_id: String, doctor_id: String },

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl HospitalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HospitalError::InvalidReference(_) | HospitalError::ValidationError(_) => {
                ErrorKind::InvalidArgument
            }
            HospitalError::HospitalNotFound(_) | HospitalError::DoctorNotFound { .. } => {
                ErrorKind::NotFound
            }
            HospitalError::Store(e) => e.kind(),
        }
    }
}

impl From<HospitalError> for AppError {
    fn from(e: HospitalError) -> Self {
        AppError::from_kind(e.kind(), e.to_string())
    }
}
