//! Top-level API error type.

use super::{AuthError, ClientError, ConfigError, StoreError, ValidationError};
use thiserror::Error;

/// Top-level error type for all client operations.
///
/// This enum aggregates all error categories, enabling unified error handling
/// while preserving the ability to match on specific error types when needed.
///
/// ## Examples
///
/// ```rust,ignore
/// use socialdesk_lib::error::ApiError;
///
/// fn handle_error(err: ApiError) {
///     match err {
///         ApiError::Client(e) => eprintln!("Network error: {e}"),
///         ApiError::Validation(e) => eprintln!("Invalid response: {e}"),
///         ApiError::Auth(e) => eprintln!("Auth failed: {e}"),
///         ApiError::Config(e) => eprintln!("Configuration error: {e}"),
///         ApiError::Store(e) => eprintln!("Session storage error: {e}"),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP client errors (network, timeout, non-success status).
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Response validation errors (parse failures, decoding failures).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Authentication and authorization errors.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Environment and URL configuration errors.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Session store errors.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Returns the HTTP status code the server answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client(e) => e.status_code(),
            Self::Auth(e) => e.status_code(),
            _ => None,
        }
    }

    /// Returns `true` if the request was rejected for missing or invalid
    /// credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::Auth(AuthError::AuthenticationFailed { .. } | AuthError::TokenExpired)
        )
    }
}
