//! Request execution with tracing instrumentation.
//!
//! This module provides the [`ApiClient`] struct. Both ways of calling the API
//! run through one pipeline:
//!
//! - [`ApiClient::send`] behaves like a wrapped `fetch`: it attaches
//!   credentials, reacts to auth and validation failures, and hands back the
//!   response whatever its status.
//! - [`ApiClient::request`] and the verb helpers build the URL from a path and
//!   query parameters, turn non-success statuses into [`ApiError`]s and parse
//!   the body with a [`ResponseFormat`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, Span};
use url::Url;

use crate::client::auth::{AuthStage, Target};
use crate::client::request::{append_query, ApiRequest, RequestBody, RequestConfig};
use crate::config::ApiConfig;
use crate::error::{ApiError, AuthError, ClientError, ConfigError};
use crate::events::UnauthorizedEvents;
use crate::method::RestMethod;
use crate::notify::{Toaster, TracingToaster, SERVER_ERROR_MESSAGE};
use crate::response::{payload, ApiResponse, HttpResponse, ResponseFormat};
use crate::session::{MemorySessionStore, SessionStore};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builder for configuring an [`ApiClient`].
pub struct ApiClientBuilder {
    config: ApiConfig,
    timeout: Duration,
    default_headers: HeaderMap,
    store: Option<Arc<dyn SessionStore>>,
    events: Option<UnauthorizedEvents>,
    toaster: Option<Arc<dyn Toaster>>,
}

impl ApiClientBuilder {
    fn new(config: ApiConfig) -> Self {
        Self {
            config,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: HeaderMap::new(),
            store: None,
            events: None,
            toaster: None,
        }
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a default header to all requests.
    ///
    /// ## Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, ApiError> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| ConfigError::invalid_header(name.as_ref(), e))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| ConfigError::invalid_header(name.as_str(), e))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the session store. Defaults to a [`MemorySessionStore`].
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the unauthorized-event registry. Defaults to a fresh one.
    pub fn events(mut self, events: UnauthorizedEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// Sets the notice sink. Defaults to [`TracingToaster`].
    pub fn toaster(mut self, toaster: Arc<dyn Toaster>) -> Self {
        self.toaster = Some(toaster);
        self
    }

    /// Builds the [`ApiClient`].
    ///
    /// ## Errors
    ///
    /// Returns an error if the API base URL is not configured or the HTTP
    /// client cannot be constructed.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let api_base = self.config.api_base_url()?;
        let login_url = self.config.login_url()?;

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.default_headers)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(ClientError::Request)?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::new()));
        let events = self.events.unwrap_or_default();
        let auth = AuthStage::new(store, events, &api_base, &login_url)?;

        Ok(ApiClient {
            http,
            config: Arc::new(self.config),
            auth,
            toaster: self.toaster.unwrap_or_else(|| Arc::new(TracingToaster)),
            timeout: self.timeout,
        })
    }
}

/// Async HTTP client for the console API.
///
/// Clones share the connection pool, session store, event registry and
/// toaster.
///
/// ## Examples
///
/// ```rust,ignore
/// use socialdesk_lib::{ApiClient, ApiConfig};
/// use socialdesk_lib::client::RequestConfig;
/// use socialdesk_lib::response::JsonFormat;
///
/// let client = ApiClient::builder(ApiConfig::from_env()).build()?;
/// let page = client
///     .get::<JsonFormat<serde_json::Value>>("accounts", RequestConfig::new().param("page", 1))
///     .await?;
/// ```
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ApiConfig>,
    auth: AuthStage,
    toaster: Arc<dyn Toaster>,
    timeout: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a new builder for configuring an API client.
    pub fn builder(config: ApiConfig) -> ApiClientBuilder {
        ApiClientBuilder::new(config)
    }

    /// Creates a client with an in-memory session and default settings.
    ///
    /// ## Errors
    ///
    /// Returns an error if the API base URL is not configured.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        Self::builder(config).build()
    }

    /// Returns the configuration this client was built from.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Returns the session store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        self.auth.store()
    }

    /// Returns the unauthorized-event registry.
    pub fn events(&self) -> &UnauthorizedEvents {
        self.auth.events()
    }

    /// Returns the notice sink.
    pub fn toaster(&self) -> &Arc<dyn Toaster> {
        &self.toaster
    }

    /// Returns `true` when a non-expired session is stored.
    ///
    /// An expired session is discarded, exactly as before a request.
    pub fn has_session(&self) -> bool {
        self.auth.current_session().is_some()
    }

    /// Sends a request through the interceptor path.
    ///
    /// The response is returned for every status. Side effects: a successful
    /// login response is stored as the session, a `401` from any endpoint
    /// other than login drops the session and raises an unauthorized event,
    /// and a `422` validation map is shown through the toaster.
    ///
    /// ## Errors
    ///
    /// Only transport failures are errors: an invalid URL, a network failure,
    /// a timeout.
    pub async fn send(&self, request: ApiRequest) -> Result<HttpResponse, ApiError> {
        let url = Url::parse(&request.url).map_err(ConfigError::from)?;
        self.dispatch(request.method, url, request.headers, request.body, None)
            .await
    }

    /// Executes a request through the generic client path.
    ///
    /// `path` is resolved under the API base URL unless it is already an
    /// absolute `http(s)` URL. `204` and empty bodies yield `data: None`.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The URL cannot be built
    /// - The request fails or is cancelled
    /// - The server returns a non-success status (`401` and `403` map to
    ///   [`AuthError`], others to [`ClientError::HttpStatus`])
    /// - The body cannot be parsed by `F`
    pub async fn request<F>(
        &self,
        method: RestMethod,
        path: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse<F::Output>, ApiError>
    where
        F: ResponseFormat,
    {
        let (params, body, mut headers, signal) = config.into_parts();
        let mut url = self.resolve(path)?;
        append_query(&mut url, &params);
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static(F::content_type()));

        let response = self.dispatch(method, url, headers, body, signal).await?;

        if !response.is_success() {
            return Err(self.failure(method, path, &response));
        }

        if response.is_empty() {
            return Ok(ApiResponse {
                data: None,
                status: response.status,
                headers: response.headers,
            });
        }

        let data = F::parse(response.body).await?;
        Ok(ApiResponse {
            data: Some(data),
            status: response.status,
            headers: response.headers,
        })
    }

    /// Executes a GET request. See [`request`](Self::request).
    ///
    /// ## Errors
    ///
    /// Fails under the same conditions as [`request`](Self::request).
    pub async fn get<F: ResponseFormat>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse<F::Output>, ApiError> {
        self.request::<F>(RestMethod::Get, path, config).await
    }

    /// Executes a POST request. See [`request`](Self::request).
    ///
    /// ## Errors
    ///
    /// Fails under the same conditions as [`request`](Self::request).
    pub async fn post<F: ResponseFormat>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse<F::Output>, ApiError> {
        self.request::<F>(RestMethod::Post, path, config).await
    }

    /// Executes a PUT request. See [`request`](Self::request).
    ///
    /// ## Errors
    ///
    /// Fails under the same conditions as [`request`](Self::request).
    pub async fn put<F: ResponseFormat>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse<F::Output>, ApiError> {
        self.request::<F>(RestMethod::Put, path, config).await
    }

    /// Executes a PATCH request. See [`request`](Self::request).
    ///
    /// ## Errors
    ///
    /// Fails under the same conditions as [`request`](Self::request).
    pub async fn patch<F: ResponseFormat>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse<F::Output>, ApiError> {
        self.request::<F>(RestMethod::Patch, path, config).await
    }

    /// Executes a DELETE request. See [`request`](Self::request).
    ///
    /// ## Errors
    ///
    /// Fails under the same conditions as [`request`](Self::request).
    pub async fn delete<F: ResponseFormat>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<ApiResponse<F::Output>, ApiError> {
        self.request::<F>(RestMethod::Delete, path, config).await
    }

    fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        let absolute = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            self.config.api_url(path)?
        };
        Ok(Url::parse(&absolute).map_err(ConfigError::from)?)
    }

    #[instrument(
        name = "api_request",
        skip(self, url, headers, body, signal),
        fields(
            http.method = %method,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    async fn dispatch(
        &self,
        method: RestMethod,
        url: Url,
        mut headers: HeaderMap,
        body: Option<RequestBody>,
        signal: Option<CancellationToken>,
    ) -> Result<HttpResponse, ApiError> {
        Span::current().record("http.url", url.as_str());

        let target = self.auth.classify(&url);

        // A caller-supplied Authorization header (e.g. a refresh token) wins.
        if let Some(token) = self.auth.bearer_for(target) {
            let value = HeaderValue::try_from(format!("Bearer {token}"))
                .map_err(|e| ConfigError::invalid_header(AUTHORIZATION.as_str(), e))?;
            headers.entry(AUTHORIZATION).or_insert(value);
        }

        let mut request = self
            .http
            .request(method.to_reqwest(), url)
            .headers(headers);
        if let Some(body) = body {
            request = body.apply(request);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>(HttpResponse {
                status,
                headers,
                body,
            })
        };

        let result = match signal {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => return Err(ClientError::Cancelled.into()),
                result = exchange => result,
            },
            None => exchange.await,
        };
        let response = result.map_err(|e| self.transport_error(e))?;

        Span::current().record("http.status_code", response.status);
        let otel_status = match response.status {
            200..=299 => "OK",
            500..=599 => "ERROR",
            _ => "UNSET",
        };
        Span::current().record("otel.status_code", otel_status);

        self.inspect(target, &response);
        Ok(response)
    }

    /// Side effects shared by both client paths.
    fn inspect(&self, target: Target, response: &HttpResponse) {
        if target == Target::Login {
            if response.is_success() {
                self.auth.capture_login(&response.body);
            }
        } else if response.status == 401 {
            let message = payload::parse(&response.body)
                .map(|p| payload::select_message(Some(&p), 401));
            self.auth.reject(message);
        }

        if response.status == 422 {
            if let Some(body) = payload::parse(&response.body) {
                for message in payload::field_messages(&body) {
                    self.toaster.error(&message);
                }
            }
        }
    }

    /// Builds the error for a non-success response on the generic path.
    fn failure(&self, method: RestMethod, path: &str, response: &HttpResponse) -> ApiError {
        let status = response.status;
        let body = payload::parse(&response.body);
        let message = payload::select_message(body.as_ref(), status);

        if status >= 500 {
            self.toaster.error(SERVER_ERROR_MESSAGE);
        } else if status == 422 && body.as_ref().is_none_or(|b| payload::field_messages(b).is_empty()) {
            self.toaster.error(&message);
        }

        match status {
            401 => AuthError::AuthenticationFailed { message }.into(),
            403 => AuthError::InsufficientPermissions {
                operation: format!("{method} {path}"),
            }
            .into(),
            _ => ClientError::HttpStatus {
                status,
                message,
                payload: body,
            }
            .into(),
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ClientError::Timeout {
                duration_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
            .into()
        } else {
            ClientError::Request(error).into()
        }
    }
}
