//! Authentication and authorization errors.

use thiserror::Error;

/// Errors related to API authentication.
///
/// These errors occur when credentials are missing locally or when the
/// server rejects them.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session is stored, so the operation cannot be authenticated.
    #[error("Not signed in")]
    NotSignedIn,

    /// The session has no refresh token.
    #[error("Session has no refresh token")]
    MissingRefreshToken,

    /// Server rejected the authentication credentials.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Error message from the server.
        message: String,
    },

    /// Token has expired and the session was discarded.
    #[error("Token expired")]
    TokenExpired,

    /// Insufficient permissions for the requested operation.
    #[error("Insufficient permissions: {operation}")]
    InsufficientPermissions {
        /// The operation that was denied.
        operation: String,
    },
}

impl AuthError {
    /// Returns `true` if this error could potentially be resolved by
    /// signing in again.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            Self::NotSignedIn | Self::TokenExpired | Self::AuthenticationFailed { .. }
        )
    }

    /// Returns the HTTP status that produced this error, if it came from the server.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { .. } => Some(401),
            Self::InsufficientPermissions { .. } => Some(403),
            _ => None,
        }
    }
}
