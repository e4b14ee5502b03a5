//! Response handling.
//!
//! - [`ResponseFormat`] selects how a success body is parsed (`json`, `text`
//!   or `blob` in the console's terms).
//! - [`HttpResponse`] is the buffered response returned by the interceptor
//!   path.
//! - [`ApiResponse`] is the parsed result of the generic request client.
//! - [`payload`] interprets error bodies.

mod format;
pub mod payload;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::ValidationError;

pub use format::{BinaryFormat, JsonFormat, PlainTextFormat, ResponseFormat};

/// A fully buffered HTTP response.
///
/// The interceptor path hands this back whatever the status, so callers decide
/// what a failure means for them.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub body: Bytes,
}

impl HttpResponse {
    /// Returns `true` for `2xx` statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `true` when there is no body to parse.
    pub fn is_empty(&self) -> bool {
        self.status == 204 || self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Parses the body as JSON.
    ///
    /// ## Errors
    ///
    /// Returns [`ValidationError::EmptyBody`] for an empty body and
    /// [`ValidationError::JsonParse`] for malformed JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Parsed result of a generic client call.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// Parsed body; `None` for `204` and empty bodies.
    pub data: Option<T>,
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
}

impl<T> ApiResponse<T> {
    /// Returns the parsed body, treating "no content" as an error.
    ///
    /// ## Errors
    ///
    /// Returns [`ValidationError::EmptyBody`] when the server sent no content.
    pub fn into_data(self) -> Result<T, ValidationError> {
        self.data.ok_or(ValidationError::EmptyBody)
    }
}
