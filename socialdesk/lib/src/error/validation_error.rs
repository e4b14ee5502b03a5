//! Response parsing and record decoding errors.

use thiserror::Error;

/// Errors during response parsing and validation.
///
/// These errors occur when a response body cannot be parsed, or when a
/// decoded resource record does not satisfy its schema.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Response content type doesn't match expected format.
    #[error("Unexpected content type: expected {expected}, got {actual}")]
    ContentTypeMismatch {
        /// The expected content type.
        expected: String,
        /// The actual content type received.
        actual: String,
    },

    /// Empty response body when content was expected.
    #[error("Empty response body")]
    EmptyBody,

    /// A record is missing a field its schema requires.
    #[error("{record} record is missing required field '{field}'")]
    MissingField {
        /// The record kind being decoded.
        record: &'static str,
        /// The field that is absent or empty.
        field: &'static str,
    },

    /// The payload is neither of the accepted shapes.
    #[error("Unexpected {record} payload: {message}")]
    UnexpectedShape {
        /// The record kind being decoded.
        record: &'static str,
        /// Description of what was found.
        message: String,
    },

    /// A job status change that the lifecycle does not allow.
    #[error("Invalid job status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },
}

impl ValidationError {
    /// Returns `true` if this is a parsing error.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::JsonParse(_))
    }

    /// Creates an unexpected shape error.
    pub fn unexpected(record: &'static str, message: impl Into<String>) -> Self {
        Self::UnexpectedShape {
            record,
            message: message.into(),
        }
    }
}
