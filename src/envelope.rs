//! Uniform result wrapper returned by every service operation
//!
//! ```json
//! { "code": 200, "message": "insert success", "body": { ... } }
//! ```
//!
//! `code` doubles as the HTTP status. `body` is `null` whenever the
//! operation produced nothing to return.

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub message: String,
    pub body: Option<T>,
}

impl<T> Envelope<T> {
    /// A 200 envelope carrying `body`
    pub fn ok(message: impl Into<String>, body: T) -> Self {
        Self {
            code: 200,
            message: message.into(),
            body: Some(body),
        }
    }

    /// An envelope with no body
    pub fn empty(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            body: None,
        }
    }

    /// Convert an error into its envelope.
    ///
    /// Store failures are logged here with their cause; the caller only sees
    /// the generic message.
    pub fn from_error(operation: &str, err: &Error) -> Self {
        if err.is_store_failure() {
            tracing::error!("{} failed: {}", operation, err);
        } else {
            tracing::warn!("{} rejected: {}", operation, err);
        }
        Self::empty(err.status_code(), err.public_message())
    }

    /// Build from a result, using `message` on success
    pub fn from_result(
        operation: &str,
        message: impl Into<String>,
        result: crate::Result<T>,
    ) -> Self {
        match result {
            Ok(body) => Self::ok(message, body),
            Err(err) => Self::from_error(operation, &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StudentField;

    #[test]
    fn test_ok_shape() {
        let envelope = Envelope::ok("find success", vec![1, 2, 3]);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["code"], 200);
        assert_eq!(json["message"], "find success");
        assert_eq!(json["body"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_error_envelope_has_null_body() {
        let err = Error::MissingField {
            field: StudentField::Email,
        };
        let envelope: Envelope<()> = Envelope::from_error("create", &err);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["code"], 400);
        assert_eq!(json["message"], "missing Email field");
        assert!(json["body"].is_null());
    }

    #[test]
    fn test_store_failure_message_is_generic() {
        let envelope: Envelope<()> =
            Envelope::from_result("list", "ok", Err(Error::StoreUnavailable));
        assert_eq!(envelope.code, 500);
        assert_eq!(envelope.message, crate::error::SERVER_ERROR_MESSAGE);
    }
}
