pub mod matrix;
pub mod phases;
pub mod potentials;
pub mod product_development;
pub mod profile;
pub mod subphases;
pub mod system;
pub mod users;

use crate::error::{sqlstate, ApiError, FOREIGN_KEY_VIOLATION};

/// Trimmed text of a required body field; absent or blank is a 400
pub(crate) fn required_text(
    value: Option<String>,
    field: &str,
    message: &str,
) -> Result<String, ApiError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::invalid_field(field, message)),
    }
}

/// Rejects a present-but-blank value for a field that may be omitted
pub(crate) fn optional_text(
    value: Option<String>,
    field: &str,
    message: &str,
) -> Result<Option<String>, ApiError> {
    value.map(|v| required_text(Some(v), field, message)).transpose()
}

pub(crate) fn no_fields() -> ApiError {
    ApiError::bad_request("No fields provided for update.")
}

/// A foreign-key miss on insert means the parent row is gone
pub(crate) fn missing_parent(err: sqlx::Error, message: &str) -> ApiError {
    match sqlstate(&err).as_deref() {
        Some(FOREIGN_KEY_VIOLATION) => ApiError::not_found(message),
        _ => ApiError::from(err),
    }
}
