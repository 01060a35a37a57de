pub mod enrichment;
pub mod queue;
pub mod wait_time;

pub use enrichment::QueueEnricher;
pub use queue::DoctorQueue;
pub use wait_time::format_estimated_wait;
