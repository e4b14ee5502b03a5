//! HTTP session layer for the socialdesk admin console.
//!
//! Every call to the console API goes through one [`ApiClient`], which keeps
//! the signed-in session consistent: it attaches the bearer token to API
//! requests, drops expired or rejected sessions, learns new sessions from
//! login responses and turns failures into user-facing notices.
//!
//! ## Core Types
//!
//! - [`ApiConfig`] - API location and storage namespace, read from the environment
//! - [`ApiClient`] - The request pipeline, with `send` (interceptor path) and
//!   `get`/`post`/`put`/`patch`/`delete` (generic path)
//! - [`RestMethod`] - HTTP methods
//!
//! ## Session
//!
//! - [`SessionStore`] - Trait for session storage backends
//! - [`FileSessionStore`] - JSON file storage with file locking
//! - [`MemorySessionStore`] - In-process storage
//! - [`SessionOwner`] - Login, logout, refresh and the sign-out reaction
//! - [`UnauthorizedEvents`] - Registry notified whenever a session is dropped
//!
//! ## Resources
//!
//! - [`ResourceClient`] - CRUD over accounts, proxies, categories, content,
//!   browser contexts and watchlist accounts
//! - [`JobClient`] - The executor job queue
//!
//! ## Examples
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use socialdesk_lib::{ApiClient, ApiConfig, FileSessionStore, SessionOwner};
//!
//! let config = ApiConfig::from_env();
//! let store = Arc::new(FileSessionStore::for_config(&config)?);
//! let client = ApiClient::builder(config).store(store).build()?;
//! let owner = SessionOwner::new(client.clone());
//! owner.login("admin@example.com", "secret").await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod method;
pub mod notify;
pub mod resources;
pub mod response;
pub mod session;

pub use client::{ApiClient, ApiClientBuilder, ApiRequest, RequestBody, RequestConfig};
pub use config::ApiConfig;
pub use error::ApiError;
pub use events::{UnauthorizedEvent, UnauthorizedEvents, UnauthorizedReason};
pub use method::RestMethod;
pub use notify::{Toaster, TracingToaster};
pub use resources::{JobClient, ListQuery, Page, RecordId, Resource, ResourceClient};
pub use response::{ApiResponse, HttpResponse};
pub use session::{
    AuthModel, FileSessionStore, MemorySessionStore, SessionOwner, SessionStore, UserModel,
};
