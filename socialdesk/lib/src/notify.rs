//! User-facing notifications raised by the request pipeline.
//!
//! Validation failures and server errors are shown to the user as
//! non-blocking notices ("toasts"). The pipeline only knows the [`Toaster`]
//! trait; front ends plug in their own presentation.

use tracing::warn;

/// Fixed notice shown for any `5xx` response.
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

/// Sink for non-blocking error notices.
pub trait Toaster: Send + Sync {
    /// Shows one error notice.
    fn error(&self, message: &str);
}

/// Toaster that records notices as `warn` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingToaster;

impl Toaster for TracingToaster {
    fn error(&self, message: &str) {
        warn!(message, "toast");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[tracing_test::traced_test]
    fn tracing_toaster_logs_message() {
        TracingToaster.error("already taken");
        assert!(logs_contain("already taken"));
    }
}
