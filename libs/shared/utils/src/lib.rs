pub mod state;
pub mod test_utils;
pub mod validation;

pub use state::AppState;
pub use validation::{validate_reference, ReferenceError};
