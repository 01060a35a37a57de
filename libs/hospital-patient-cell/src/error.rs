use thiserror::Error;

use hospital_cell::HospitalError;
use shared_database::{SequenceError, StoreError};
use shared_models::{AppError, ErrorKind};
use shared_utils::ReferenceError;

#[derive(Error, Debug)]
pub enum HospitalPatientError {
    #[error(transparent)]
    InvalidReference(#[from] ReferenceError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Hospital not found: {0}")]
    HospitalNotFound(String),

    #[error("Patient code not found: {0}")]
    PatientCodeNotFound(String),

    #[error("Patient {patient_code} is not registered at hospital {hospital_id}. Please join the hospital first.")]
    NotEnrolled { patient_code: String, hospital_id: String },

    #[error("Patient with phone {phone} is already registered at hospital {hospital_id}")]
    AlreadyEnrolled { hospital_id: String, phone: String },

    #[error("Patient {patient_code} is already in the queue")]
    AlreadyQueued { patient_code: String },

    #[error("Could not issue a unique patient code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },

    #[error(transparent)]
    Directory(#[from] HospitalError),

    #[error("Queue number assignment failed: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl HospitalPatientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HospitalPatientError::InvalidReference(_) | HospitalPatientError::ValidationError(_) => {
                ErrorKind::InvalidArgument
            }
            HospitalPatientError::HospitalNotFound(_)
            | HospitalPatientError::PatientCodeNotFound(_)
            | HospitalPatientError::NotEnrolled { .. } => ErrorKind::NotFound,
            HospitalPatientError::AlreadyEnrolled { .. } | HospitalPatientError::AlreadyQueued { .. } => {
                ErrorKind::Conflict
            }
            HospitalPatientError::CodeSpaceExhausted { .. } => ErrorKind::Unavailable,
            HospitalPatientError::Directory(e) => e.kind(),
            HospitalPatientError::Sequence(e) => e.kind(),
            HospitalPatientError::Store(e) => e.kind(),
        }
    }
}

impl From<HospitalPatientError> for AppError {
    fn from(e: HospitalPatientError) -> Self {
        AppError::from_kind(e.kind(), e.to_string())
    }
}
