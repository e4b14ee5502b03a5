//! Session persistence errors.

use thiserror::Error;

/// Errors that can occur when reading or writing the session store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read or write the session file.
    #[error("failed to access session storage: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or parse the stored session.
    #[error("failed to parse stored session: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to acquire a file lock.
    #[error("failed to acquire session lock")]
    Lock,
}
