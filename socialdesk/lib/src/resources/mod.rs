//! Typed access to console resources.
//!
//! Each record type implements [`Resource`]: a collection path plus an
//! explicit decoder from the raw JSON the backend returns. Decoders accept
//! camelCase and snake_case keys and nested `{ "proxy": { "id": .. } }`
//! references, and reject records missing a required field with a
//! [`ValidationError`].
//!
//! [`ResourceClient`] provides CRUD over any [`Resource`]; [`JobClient`]
//! covers the executor job queue.

mod account;
mod browser_context;
mod category;
mod content;
mod id;
mod jobs;
mod proxy;
mod watchlist;

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::client::{ApiClient, RequestConfig};
use crate::error::{ApiError, ValidationError};
use crate::response::JsonFormat;

pub use account::Account;
pub use browser_context::{BrowserContext, Viewport};
pub use category::Category;
pub use content::Content;
pub use id::RecordId;
pub use jobs::{ExecutorJob, JobClient, JobStatus, NewJob};
pub use proxy::Proxy;
pub use watchlist::WatchlistAccount;

pub(crate) use id::{flat_or_nested, NestedRef};

/// A record type served from one collection endpoint.
pub trait Resource: Sized + Send {
    /// Record name used in error messages.
    const NAME: &'static str;

    /// Collection path relative to the API base URL.
    const PATH: &'static str;

    /// Decodes one record from its JSON form.
    ///
    /// ## Errors
    ///
    /// Returns a [`ValidationError`] when the value is not an object of this
    /// record's shape or lacks a required field.
    fn decode(value: Value) -> Result<Self, ValidationError>;
}

/// Decodes `value` through the wire type `W`, then validates it into `R`.
pub(crate) fn decode_via<W, R>(record: &'static str, value: Value) -> Result<R, ValidationError>
where
    W: for<'de> Deserialize<'de>,
    R: TryFrom<W, Error = ValidationError>,
{
    if !value.is_object() {
        return Err(ValidationError::unexpected(
            record,
            format!("expected an object, got {}", kind(&value)),
        ));
    }
    let wire: W = serde_json::from_value(value)?;
    R::try_from(wire)
}

/// Returns the string when present and not blank.
pub(crate) fn required(
    record: &'static str,
    field: &'static str,
    value: Option<String>,
) -> Result<String, ValidationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ValidationError::MissingField { record, field })
}

/// Pagination metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    /// Total number of records across all pages.
    #[serde(default)]
    pub total: Option<u64>,
    /// Current page, starting at 1.
    #[serde(default)]
    pub page: Option<u64>,
    /// Page size.
    #[serde(default)]
    pub limit: Option<u64>,
    /// Number of pages.
    #[serde(default, alias = "totalPages")]
    pub total_pages: Option<u64>,
}

/// One page of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Pagination metadata, when the server sent any.
    pub meta: Option<PageMeta>,
}

impl<T: Resource> Page<T> {
    /// Decodes a page from `{ "data": [...], "meta": {...} }` or a bare array.
    ///
    /// ## Errors
    ///
    /// Returns [`ValidationError::UnexpectedShape`] for any other shape, or
    /// the first record's decoding error.
    pub fn decode(value: Value) -> Result<Self, ValidationError> {
        let (items, meta) = match value {
            Value::Array(items) => (items, None),
            Value::Object(mut map) => {
                let items = match map.remove("data") {
                    Some(Value::Array(items)) => items,
                    Some(other) => {
                        return Err(ValidationError::unexpected(
                            T::NAME,
                            format!("expected `data` to be an array, got {}", kind(&other)),
                        ));
                    }
                    None => {
                        return Err(ValidationError::unexpected(
                            T::NAME,
                            "expected a `data` array or a bare array",
                        ));
                    }
                };
                let meta = match map.remove("meta") {
                    Some(Value::Null) | None => None,
                    Some(meta) => Some(serde_json::from_value(meta)?),
                };
                (items, meta)
            }
            other => {
                return Err(ValidationError::unexpected(
                    T::NAME,
                    format!("expected a list, got {}", kind(&other)),
                ));
            }
        };

        let items = items
            .into_iter()
            .map(T::decode)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { items, meta })
    }
}

/// Query for list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Page number, starting at 1.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Extra filters; repeated keys are sent as repeated parameters.
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page number.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Adds a filter parameter.
    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push((key.into(), value.to_string()));
        self
    }

    fn to_config(&self) -> RequestConfig {
        self.filters.iter().fold(
            RequestConfig::new()
                .param_opt("page", self.page)
                .param_opt("limit", self.limit),
            |config, (key, value)| config.param(key.clone(), value),
        )
    }
}

/// CRUD client for one resource type.
///
/// ## Examples
///
/// ```rust,ignore
/// use socialdesk_lib::resources::{Account, ListQuery, ResourceClient};
///
/// let accounts = ResourceClient::<Account>::new(&client);
/// let page = accounts.list(&ListQuery::new().page(1).limit(20)).await?;
/// ```
#[derive(Debug)]
pub struct ResourceClient<'a, R> {
    client: &'a ApiClient,
    _record: PhantomData<fn() -> R>,
}

impl<'a, R: Resource> ResourceClient<'a, R> {
    /// Creates a client for `R` over `client`.
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    fn item_path(id: &RecordId) -> String {
        format!("{}/{}", R::PATH, id)
    }

    /// Lists one page of records.
    ///
    /// ## Errors
    ///
    /// Returns request, status and decoding errors.
    #[instrument(skip(self), fields(resource = R::NAME))]
    pub async fn list(&self, query: &ListQuery) -> Result<Page<R>, ApiError> {
        let value = self
            .client
            .get::<JsonFormat<Value>>(R::PATH, query.to_config())
            .await?
            .into_data()?;
        Ok(Page::decode(value)?)
    }

    /// Fetches one record.
    ///
    /// ## Errors
    ///
    /// Returns request, status and decoding errors; an empty body is
    /// [`ValidationError::EmptyBody`].
    #[instrument(skip(self), fields(resource = R::NAME))]
    pub async fn get(&self, id: &RecordId) -> Result<R, ApiError> {
        self.fetch_one(
            self.client
                .get::<JsonFormat<Value>>(&Self::item_path(id), RequestConfig::new())
                .await?
                .into_data()?,
        )
    }

    /// Creates a record from `body`.
    ///
    /// ## Errors
    ///
    /// Returns serialization, request, status and decoding errors.
    #[instrument(skip(self, body), fields(resource = R::NAME))]
    pub async fn create<B: Serialize + ?Sized>(&self, body: &B) -> Result<R, ApiError> {
        let config = RequestConfig::new().json(body)?;
        self.fetch_one(
            self.client
                .post::<JsonFormat<Value>>(R::PATH, config)
                .await?
                .into_data()?,
        )
    }

    /// Partially updates a record (`PATCH`).
    ///
    /// ## Errors
    ///
    /// Returns serialization, request, status and decoding errors.
    #[instrument(skip(self, body), fields(resource = R::NAME))]
    pub async fn update<B: Serialize + ?Sized>(&self, id: &RecordId, body: &B) -> Result<R, ApiError> {
        let config = RequestConfig::new().json(body)?;
        self.fetch_one(
            self.client
                .patch::<JsonFormat<Value>>(&Self::item_path(id), config)
                .await?
                .into_data()?,
        )
    }

    /// Replaces a record (`PUT`).
    ///
    /// ## Errors
    ///
    /// Returns serialization, request, status and decoding errors.
    #[instrument(skip(self, body), fields(resource = R::NAME))]
    pub async fn replace<B: Serialize + ?Sized>(&self, id: &RecordId, body: &B) -> Result<R, ApiError> {
        let config = RequestConfig::new().json(body)?;
        self.fetch_one(
            self.client
                .put::<JsonFormat<Value>>(&Self::item_path(id), config)
                .await?
                .into_data()?,
        )
    }

    /// Deletes a record. A `204` or any other empty success counts as done.
    ///
    /// ## Errors
    ///
    /// Returns request and status errors.
    #[instrument(skip(self), fields(resource = R::NAME))]
    pub async fn delete(&self, id: &RecordId) -> Result<(), ApiError> {
        self.client
            .delete::<JsonFormat<Value>>(&Self::item_path(id), RequestConfig::new())
            .await?;
        Ok(())
    }

    /// Single-record endpoints sometimes wrap the record as `{ "data": {..} }`.
    fn fetch_one(&self, value: Value) -> Result<R, ApiError> {
        Ok(R::decode(unwrap_data(value))?)
    }
}

/// Unwraps `{ "data": { .. } }` envelopes around a single object.
pub(crate) fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() <= 2 && map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_decodes_envelope_with_meta() {
        let page = Page::<Category>::decode(json!({
            "data": [{ "id": 1, "name": "News" }],
            "meta": { "total": 41, "page": 1, "limit": 20, "totalPages": 3 }
        }))
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.meta.unwrap().total_pages, Some(3));
    }

    #[test]
    fn page_decodes_bare_array() {
        let page = Page::<Category>::decode(json!([{ "id": 1, "name": "News" }, { "id": 2, "name": "Sport" }])).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.meta.is_none());
    }

    #[test]
    fn page_rejects_other_shapes() {
        let err = Page::<Category>::decode(json!({ "items": [] })).unwrap_err();
        assert!(matches!(err, ValidationError::UnexpectedShape { record: "category", .. }));
        assert!(Page::<Category>::decode(json!("nope")).is_err());
    }

    #[test]
    fn page_surfaces_record_errors() {
        let err = Page::<Category>::decode(json!([{ "id": 1 }])).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField { field: "name", .. }));
    }

    #[test]
    fn list_query_builds_params() {
        let config = ListQuery::new().page(2).limit(50).filter("status", "active").to_config();
        assert_eq!(
            config.params(),
            &[
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "50".to_string()),
                ("status".to_string(), "active".to_string()),
            ]
        );
    }

    #[test]
    fn unwrap_data_only_strips_object_envelopes() {
        assert_eq!(unwrap_data(json!({ "data": { "id": 1 } })), json!({ "id": 1 }));
        assert_eq!(unwrap_data(json!({ "id": 1, "data": "x" })), json!({ "id": 1, "data": "x" }));
    }
}
