//! HTTP client for the console API.
//!
//! [`ApiClient`] owns the connection pool and runs every request through one
//! pipeline: session expiry, bearer attachment, login capture, `401` and
//! `422` handling. See [`ApiClient::send`] for the interceptor path and
//! [`ApiClient::request`] for the generic one.

mod auth;
mod executor;
mod request;

pub use executor::{ApiClient, ApiClientBuilder};
pub use request::{append_query, ApiRequest, RequestBody, RequestConfig};
