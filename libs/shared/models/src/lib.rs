pub mod error;

pub use error::{AppError, ErrorKind};
