//! Input validation for the roster
//!
//! Two concerns live here:
//! - request payloads: required fields on creation, non-empty values on update
//! - store document ids, which become file names in the markdown store and
//!   must never be able to escape the collection directory

use thiserror::Error;

use crate::error::{Error, Result};
use crate::model::{NewStudent, StudentField, StudentPatch, StudentProfile};

/// Document id validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid document id '{0}': {1}")]
    InvalidIdentifier(String, &'static str),

    #[error("Document id '{0}' is too long (max {1} characters)")]
    TooLong(String, usize),

    #[error("Document id cannot be empty")]
    Empty,
}

/// Maximum length for document ids
pub const MAX_DOCUMENT_ID_LENGTH: usize = 64;

/// Check that every caller-supplied field is present and non-empty.
///
/// Fields are checked in [`StudentField::INPUT`] order and the first failure
/// wins, so the message always names exactly one field.
pub fn require_fields(input: &NewStudent) -> Result<StudentProfile> {
    for field in StudentField::INPUT {
        match input.get(field) {
            None => return Err(Error::MissingField { field }),
            Some(value) if value.trim().is_empty() => return Err(Error::MissingField { field }),
            Some(_) => {}
        }
    }

    // Every field was checked above
    let take = |value: &Option<String>| value.clone().unwrap_or_default();
    Ok(StudentProfile {
        account: take(&input.account),
        name: take(&input.name),
        department: take(&input.department),
        grade_year: take(&input.grade_year),
        class_name: take(&input.class_name),
        email: take(&input.email),
    })
}

/// Check a partial update.
///
/// A patch must set at least one field, and any field it sets must be
/// non-empty, so an update can never break the creation invariant.
pub fn check_patch(patch: &StudentPatch) -> Result<()> {
    if patch.is_empty() {
        return Err(Error::InvalidPayload {
            message: "no updatable fields supplied".to_string(),
        });
    }

    for field in StudentField::INPUT {
        if let Some(value) = patch.get(field) {
            if value.trim().is_empty() {
                return Err(Error::EmptyField { field });
            }
        }
    }

    Ok(())
}

/// Validate a store document id
///
/// Rules:
/// - Must be 1-64 characters
/// - Only ASCII alphanumerics, underscore, and hyphen allowed
/// - Cannot start with a hyphen or underscore
pub fn validate_document_id(id: &str) -> std::result::Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::Empty);
    }

    if id.len() > MAX_DOCUMENT_ID_LENGTH {
        return Err(ValidationError::TooLong(id.to_string(), MAX_DOCUMENT_ID_LENGTH));
    }

    for (i, c) in id.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
            return Err(ValidationError::InvalidIdentifier(
                id.to_string(),
                "contains invalid characters (only alphanumeric, underscore, and hyphen allowed)",
            ));
        }
        if i == 0 && (c == '-' || c == '_') {
            return Err(ValidationError::InvalidIdentifier(
                id.to_string(),
                "cannot start with hyphen or underscore",
            ));
        }
    }

    Ok(())
}
