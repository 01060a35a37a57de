pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::HospitalPatientError;
pub use models::*;
pub use router::create_hospital_patient_router;
pub use services::{CodeSource, EnrollmentLedger, RandomCodeSource, WaitQueue};
