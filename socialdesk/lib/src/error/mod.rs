//! Layered error types for the session layer.
//!
//! The error hierarchy is structured for actionable diagnostics:
//! - [`ApiError`] - Top-level error type for all client operations
//! - [`ClientError`] - HTTP client, network and status errors
//! - [`ValidationError`] - Response parsing and record decoding errors
//! - [`AuthError`] - Authentication and authorization errors
//! - [`ConfigError`] - Environment and URL configuration errors
//! - [`StoreError`] - Session persistence errors

mod api_error;
mod auth_error;
mod client_error;
mod config_error;
mod store_error;
mod validation_error;

pub use api_error::ApiError;
pub use auth_error::AuthError;
pub use client_error::ClientError;
pub use config_error::ConfigError;
pub use store_error::StoreError;
pub use validation_error::ValidationError;
