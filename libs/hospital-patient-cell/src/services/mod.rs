pub mod enrollment;
pub mod identity;
pub mod wait_queue;

pub use enrollment::EnrollmentLedger;
pub use identity::{is_valid_patient_code, CodeSource, RandomCodeSource};
pub use wait_queue::WaitQueue;
