//! Request descriptions for both client paths.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{ConfigError, ValidationError};
use crate::method::RestMethod;

/// A request body.
#[derive(Debug)]
pub enum RequestBody {
    /// Serialized as JSON with `Content-Type: application/json`.
    Json(serde_json::Value),
    /// A multipart form, passed through untouched.
    Multipart(reqwest::multipart::Form),
    /// Pre-encoded bytes, passed through untouched.
    Raw {
        /// Content type to send, if any.
        content_type: Option<String>,
        /// The encoded body.
        bytes: Bytes,
    },
}

impl RequestBody {
    /// Serializes `value` into a JSON body.
    ///
    /// ## Errors
    ///
    /// Returns [`ValidationError::JsonParse`] if `value` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ValidationError> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    pub(crate) fn apply(self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Json(value) => request.json(&value),
            Self::Multipart(form) => request.multipart(form),
            Self::Raw { content_type, bytes } => {
                let request = match content_type {
                    Some(content_type) => request.header(CONTENT_TYPE, content_type),
                    None => request,
                };
                request.body(bytes)
            }
        }
    }
}

/// Options for a generic client call.
///
/// ## Examples
///
/// ```rust
/// use socialdesk_lib::client::RequestConfig;
///
/// let config = RequestConfig::new()
///     .param("page", 2)
///     .param_list("status", ["active", "paused"]);
/// assert_eq!(config.params().len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct RequestConfig {
    params: Vec<(String, String)>,
    data: Option<RequestBody>,
    headers: HeaderMap,
    signal: Option<CancellationToken>,
}

impl RequestConfig {
    /// Creates an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Adds a query parameter when `value` is present.
    pub fn param_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Adds one query parameter per value, repeating the key.
    pub fn param_list<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let key = key.into();
        self.params
            .extend(values.into_iter().map(|v| (key.clone(), v.to_string())));
        self
    }

    /// Sets a JSON body.
    ///
    /// ## Errors
    ///
    /// Returns [`ValidationError::JsonParse`] if `value` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, ValidationError> {
        self.data = Some(RequestBody::json(value)?);
        Ok(self)
    }

    /// Sets the body.
    pub fn body(mut self, body: RequestBody) -> Self {
        self.data = Some(body);
        self
    }

    /// Adds a header.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidHeader`] if the name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self, ConfigError> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Attaches a cancellation signal.
    pub fn signal(mut self, token: CancellationToken) -> Self {
        self.signal = Some(token);
        self
    }

    /// Returns the query parameters in insertion order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        Vec<(String, String)>,
        Option<RequestBody>,
        HeaderMap,
        Option<CancellationToken>,
    ) {
        (self.params, self.data, self.headers, self.signal)
    }
}

/// A request for the interceptor path.
///
/// The URL is used as given; credentials are only attached when it points
/// under the API base URL.
#[derive(Debug)]
pub struct ApiRequest {
    pub(crate) method: RestMethod,
    pub(crate) url: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<RequestBody>,
}

impl ApiRequest {
    /// Creates a request with no headers or body.
    pub fn new(method: RestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(RestMethod::Get, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(RestMethod::Post, url)
    }

    /// Creates a DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(RestMethod::Delete, url)
    }

    /// Adds a header.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidHeader`] if the name or value is invalid.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self, ConfigError> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Sets a JSON body.
    ///
    /// ## Errors
    ///
    /// Returns [`ValidationError::JsonParse`] if `value` cannot be represented as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, ValidationError> {
        self.body = Some(RequestBody::json(value)?);
        Ok(self)
    }

    /// Sets the body.
    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }
}

/// Appends `params` to `url`'s query string, percent-encoding each pair.
///
/// Repeated keys are kept as separate pairs. An empty list leaves the URL
/// untouched.
pub fn append_query(url: &mut Url, params: &[(String, String)]) {
    if params.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (key, value) in params {
        pairs.append_pair(key, value);
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let header_name =
        HeaderName::try_from(name).map_err(|e| ConfigError::invalid_header(name, e))?;
    let header_value =
        HeaderValue::try_from(value).map_err(|e| ConfigError::invalid_header(name, e))?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_repeat_the_key() {
        let config = RequestConfig::new()
            .param("page", 1)
            .param_list("ids", [3, 5])
            .param_opt("q", None::<&str>);
        let mut url = Url::parse("https://api.example.com/accounts").unwrap();
        append_query(&mut url, config.params());
        assert_eq!(url.as_str(), "https://api.example.com/accounts?page=1&ids=3&ids=5");
    }

    #[test]
    fn params_are_percent_encoded() {
        let mut url = Url::parse("https://api.example.com/accounts").unwrap();
        append_query(&mut url, &[("q".to_string(), "a b&c".to_string())]);
        assert_eq!(url.query(), Some("q=a+b%26c"));
    }

    #[test]
    fn empty_params_leave_url_alone() {
        let mut url = Url::parse("https://api.example.com/accounts").unwrap();
        append_query(&mut url, &[]);
        assert_eq!(url.as_str(), "https://api.example.com/accounts");
    }

    #[test]
    fn invalid_header_is_rejected() {
        let err = RequestConfig::new().header("bad header", "v").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHeader { .. }));
    }

    #[test]
    fn json_body_is_captured() {
        let request = ApiRequest::post("https://x.io")
            .json(&serde_json::json!({ "a": 1 }))
            .unwrap();
        assert!(matches!(request.body, Some(RequestBody::Json(_))));
    }
}
