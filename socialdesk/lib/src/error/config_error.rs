//! Environment and URL configuration errors.

use thiserror::Error;

/// Errors in client configuration.
///
/// These errors occur while composing URLs from the environment, typically
/// indicating a missing or malformed variable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting is empty or absent.
    #[error("{setting} is not configured")]
    NotConfigured {
        /// The environment variable or setting that is missing.
        setting: &'static str,
    },

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// No directory is available to hold the session file.
    #[error("No configuration directory available for session storage")]
    NoStorageDir,

    /// A header name or value could not be used.
    #[error("Invalid header {name}: {message}")]
    InvalidHeader {
        /// The header name as given.
        name: String,
        /// Why the header was rejected.
        message: String,
    },
}

impl ConfigError {
    /// Creates a not-configured error.
    pub fn not_configured(setting: &'static str) -> Self {
        Self::NotConfigured { setting }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.to_string(),
        }
    }
}
