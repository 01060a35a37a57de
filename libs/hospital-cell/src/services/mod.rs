pub mod directory;

pub use directory::HospitalDirectory;
