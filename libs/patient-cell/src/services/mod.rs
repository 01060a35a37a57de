pub mod patient;

pub use patient::PatientService;
