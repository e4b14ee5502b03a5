//! Environment configuration and API URL composition.
//!
//! The API location is split across three variables (base URL, optional path
//! prefix, optional version segment). [`ApiConfig`] joins them with exactly one
//! slash between non-empty segments, so callers can pass values with or
//! without leading and trailing slashes.
//!
//! ## Examples
//!
//! ```
//! use socialdesk_lib::ApiConfig;
//!
//! let config = ApiConfig::new("https://api.example.com/").with_prefix("v2");
//! assert_eq!(
//!     config.api_url("foo/bar").unwrap(),
//!     "https://api.example.com/v2/foo/bar"
//! );
//! ```

use std::env;

use url::Url;

use crate::error::ConfigError;

/// Environment variable holding the API origin.
pub const API_URL_ENV: &str = "SOCIALDESK_API_URL";
/// Environment variable holding the optional path prefix.
pub const API_PREFIX_ENV: &str = "SOCIALDESK_API_PREFIX";
/// Environment variable holding the optional version segment.
pub const API_VERSION_ENV: &str = "SOCIALDESK_API_VERSION";
/// Environment variable namespacing the session storage key.
pub const APP_NAME_ENV: &str = "SOCIALDESK_APP_NAME";
/// Environment variable versioning the session storage key.
pub const APP_VERSION_ENV: &str = "SOCIALDESK_APP_VERSION";

/// Path of the email login endpoint, relative to the API base URL.
pub const LOGIN_PATH: &str = "auth/email/login";

const DEFAULT_APP_NAME: &str = "socialdesk";
const DEFAULT_APP_VERSION: &str = "1";

/// Location of the API and the namespace used for client-side storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiConfig {
    /// API origin, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Optional path prefix, e.g. `api`.
    pub prefix: String,
    /// Optional version segment, e.g. `v1`.
    pub version: String,
    /// Application name used to namespace the storage key.
    pub app_name: String,
    /// Application version used to namespace the storage key.
    pub app_version: String,
}

impl ApiConfig {
    /// Creates a config pointing at `base_url` with no prefix or version.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Reads the configuration from the environment.
    ///
    /// Every variable is optional here; an unset variable becomes the empty
    /// string and is only rejected when a URL is actually built.
    pub fn from_env() -> Self {
        let read = |key: &str| env::var(key).unwrap_or_default();
        Self {
            base_url: read(API_URL_ENV),
            prefix: read(API_PREFIX_ENV),
            version: read(API_VERSION_ENV),
            app_name: read(APP_NAME_ENV),
            app_version: read(APP_VERSION_ENV),
        }
    }

    /// Sets the path prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the version segment.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the application name and version used for the storage key.
    pub fn with_app(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.app_name = name.into();
        self.app_version = version.into();
        self
    }

    /// Returns the API base URL: origin, prefix and version joined with single
    /// slashes and no trailing slash.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when the base URL is empty and
    /// [`ConfigError::InvalidUrl`] when the result does not parse.
    pub fn api_base_url(&self) -> Result<String, ConfigError> {
        let origin = self.base_url.trim().trim_end_matches('/');
        if origin.is_empty() {
            return Err(ConfigError::not_configured(API_URL_ENV));
        }

        let joined = join_segments(origin, &[&self.prefix, &self.version]);
        Url::parse(&joined)?;
        Ok(joined)
    }

    /// Returns the absolute URL of `path` under the API base URL.
    ///
    /// Leading slashes on `path` are ignored.
    ///
    /// ## Errors
    ///
    /// Fails under the same conditions as [`api_base_url`](Self::api_base_url).
    pub fn api_url(&self, path: &str) -> Result<String, ConfigError> {
        let base = self.api_base_url()?;
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Ok(base);
        }
        Ok(format!("{base}/{path}"))
    }

    /// Returns the absolute URL of the email login endpoint.
    ///
    /// ## Errors
    ///
    /// Fails under the same conditions as [`api_base_url`](Self::api_base_url).
    pub fn login_url(&self) -> Result<String, ConfigError> {
        self.api_url(LOGIN_PATH)
    }

    /// Returns the key that namespaces the stored session, e.g.
    /// `socialdesk-auth-v1`.
    pub fn storage_key(&self) -> String {
        let name = non_empty_or(&self.app_name, DEFAULT_APP_NAME);
        let version = non_empty_or(&self.app_version, DEFAULT_APP_VERSION);
        format!("{name}-auth-v{version}")
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() { fallback } else { value }
}

fn join_segments(origin: &str, segments: &[&str]) -> String {
    let mut joined = origin.to_string();
    for segment in segments {
        let segment = segment.trim().trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        joined.push('/');
        joined.push_str(segment);
    }
    joined
}
