pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::DoctorQueueError;
pub use models::*;
pub use router::create_doctor_queue_router;
pub use services::{format_estimated_wait, DoctorQueue, QueueEnricher};
