use thiserror::Error;

use shared_database::{SequenceError, StoreError};
use shared_models::{AppError, ErrorKind};
use shared_utils::ReferenceError;
use triage_cell::TriageError;

#[derive(Error, Debug)]
pub enum DoctorQueueError {
    #[error(transparent)]
    InvalidReference(#[from] ReferenceError),

    #[error("priority_level must be between 1 and 10, got {0}")]
    InvalidPriority(i64),

    #[error("Queue entry not found: {0}")]
    EntryNotFound(String),

    #[error("Patient {patient_user_id} is already in queue for doctor {doctor_id}")]
    AlreadyQueued { patient_user_id: String, doctor_id: String },

    #[error(transparent)]
    Report(#[from] TriageError),

    #[error("Queue order assignment failed: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl DoctorQueueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DoctorQueueError::InvalidReference(_) | DoctorQueueError::InvalidPriority(_) => {
                ErrorKind::InvalidArgument
            }
            DoctorQueueError::EntryNotFound(_) => ErrorKind::NotFound,
            DoctorQueueError::AlreadyQueued { .. } => ErrorKind::Conflict,
            DoctorQueueError::Report(e) => e.kind(),
            DoctorQueueError::Sequence(e) => e.kind(),
            DoctorQueueError::Store(e) => e.kind(),
        }
    }
}

impl From<DoctorQueueError> for AppError {
    fn from(e: DoctorQueueError) -> Self {
        AppError::from_kind(e.kind(), e.to_string())
    }
}
