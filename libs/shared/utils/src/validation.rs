use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {field}: '{value}' is not a well-formed reference")]
pub struct ReferenceError {
    pub field: &'static str,
    pub value: String,
}

/// Parses an opaque reference identifier. Malformed values are rejected
/// before any store access.
pub fn validate_reference(field: &'static str, value: &str) -> Result<Uuid, ReferenceError> {
    Uuid::parse_str(value.trim()).map_err(|_| ReferenceError {
        field,
        value: value.to_string(),
    })
}
