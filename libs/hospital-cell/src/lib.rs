pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::HospitalError;
pub use models::*;
pub use router::create_hospital_router;
pub use services::HospitalDirectory;
