//! Error types for the roster
//!
//! Every failure is classified into one of three classes that the service
//! layer maps onto envelope codes: client input (400), lookups that find
//! nothing (404), and store failures (500).

use std::path::PathBuf;
use thiserror::Error;

use crate::model::StudentField;
use crate::seat::ValidationOutcome;

/// Message returned to callers for every store-side failure.
pub const SERVER_ERROR_MESSAGE: &str = "server error";

/// The main error type for roster operations
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Input Errors
    // ==========================================================================
    #[error("missing {} field", .field.label())]
    MissingField { field: StudentField },

    #[error("{} field cannot be empty", .field.label())]
    EmptyField { field: StudentField },

    #[error("unknown field '{name}'")]
    UnknownField { name: String },

    #[error("invalid request body: {message}")]
    InvalidPayload { message: String },

    #[error("{}", .0.message())]
    InvalidIdentifier(ValidationOutcome),

    #[error("account '{key}' matches {count} students")]
    AmbiguousKey { key: String, count: usize },

    // ==========================================================================
    // Lookup Errors
    // ==========================================================================
    #[error("student not found")]
    StudentNotFound { key: String },

    #[error("no students found")]
    NoMatches { field: StudentField, value: String },

    // ==========================================================================
    // Store Errors
    // ==========================================================================
    #[error("store is not connected")]
    StoreUnavailable,

    #[error("seat numbers exhausted: highest stored seat is {highest}")]
    SeatNumbersExhausted { highest: u32 },

    #[error("Unreadable record '{path}': {message}")]
    UnreadableRecord { path: PathBuf, message: String },

    #[error("Document '{id}' already exists in collection '{collection}'")]
    DocumentAlreadyExists { collection: String, id: String },

    #[error("Invalid document id '{id}': {reason}")]
    InvalidDocumentId { id: String, reason: &'static str },

    #[error("Git operation failed: {message}")]
    Git {
        message: String,
        #[source]
        source: Option<git2::Error>,
    },

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ==========================================================================
    // Serialization Errors
    // ==========================================================================
    #[error("Failed to parse YAML: {message}")]
    YamlParse { message: String },

    #[error("Failed to serialize to YAML: {message}")]
    YamlSerialize { message: String },

    #[error("Failed to parse JSON: {message}")]
    JsonParse { message: String },

    // ==========================================================================
    // Catch-all
    // ==========================================================================
    #[error("{0}")]
    Other(String),
}

/// Result type alias for roster operations
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Conversions from external error types
// =============================================================================

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::Git {
            message: err.message().to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::YamlParse {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonParse {
            message: err.to_string(),
        }
    }
}

impl From<crate::validation::ValidationError> for Error {
    fn from(err: crate::validation::ValidationError) -> Self {
        match err {
            crate::validation::ValidationError::Empty => Error::InvalidDocumentId {
                id: String::new(),
                reason: "cannot be empty",
            },
            crate::validation::ValidationError::TooLong(id, _max) => Error::InvalidDocumentId {
                id,
                reason: "exceeds maximum length",
            },
            crate::validation::ValidationError::InvalidIdentifier(id, reason) => {
                Error::InvalidDocumentId { id, reason }
            }
        }
    }
}

// =============================================================================
// Classification
// =============================================================================

impl Error {
    /// Envelope code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MissingField { .. }
            | Error::EmptyField { .. }
            | Error::UnknownField { .. }
            | Error::InvalidPayload { .. }
            | Error::InvalidIdentifier(_)
            | Error::AmbiguousKey { .. } => 400,
            Error::StudentNotFound { .. } | Error::NoMatches { .. } => 404,
            _ => 500,
        }
    }

    /// Returns true for errors caused by the store rather than the caller
    pub fn is_store_failure(&self) -> bool {
        self.status_code() == 500
    }

    /// Message safe to hand back to a caller.
    ///
    /// Store failures collapse to a generic message; the cause is logged by
    /// whoever builds the envelope.
    pub fn public_message(&self) -> String {
        if self.is_store_failure() {
            SERVER_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_the_field() {
        let err = Error::MissingField {
            field: StudentField::Email,
        };
        assert_eq!(err.to_string(), "missing Email field");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_store_failures_are_masked() {
        let err = Error::FileWrite {
            path: PathBuf::from("collections/students/abc.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), SERVER_ERROR_MESSAGE);
    }

    #[test]
    fn test_exhausted_seats_are_store_failures() {
        let err = Error::SeatNumbersExhausted { highest: u32::MAX };
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), SERVER_ERROR_MESSAGE);
    }

    #[test]
    fn test_not_found_class() {
        let err = Error::StudentNotFound {
            key: "tkubm1760".into(),
        };
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.public_message(), "student not found");
    }
}
