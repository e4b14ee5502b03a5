//! Social network executor jobs.
//!
//! A job asks the executor to perform one `action` on one `platform`. The
//! executor moves it through a fixed lifecycle:
//!
//! ```text
//! PENDING -> PROCESSING -> SUCCESS | FAILED | TIMEOUT
//! ```
//!
//! Terminal states stay terminal. [`JobClient::update_status`] refuses any
//! other move before a request is made.

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{Display, EnumIter, EnumString};
use tracing::{info, instrument};

use super::{decode_via, unwrap_data, ListQuery, Page, RecordId, Resource};
use crate::client::{ApiClient, RequestConfig};
use crate::error::{ApiError, ValidationError};
use crate::response::JsonFormat;

/// Lifecycle state of an [`ExecutorJob`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum JobStatus {
    /// Queued, not yet picked up.
    Pending,
    /// Picked up by an executor.
    Processing,
    /// Finished successfully.
    Success,
    /// Finished with an error.
    Failed,
    /// Ran past its deadline.
    Timeout,
}

impl JobStatus {
    /// Returns `true` once the job can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Timeout)
    }

    /// Returns `true` if the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => next == Self::Processing,
            Self::Processing => next.is_terminal(),
            Self::Success | Self::Failed | Self::Timeout => false,
        }
    }
}

/// A job on the executor queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutorJob {
    /// Record id.
    pub id: RecordId,
    /// Target platform.
    pub platform: String,
    /// Action the executor performs, e.g. `post`.
    pub action: String,
    /// Action arguments.
    pub payload: Value,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Executor output on success.
    pub result: Option<Value>,
    /// Failure message.
    pub error: Option<String>,
    /// When processing started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecutorJobWire {
    id: RecordId,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    payload: Value,
    status: JobStatus,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default, deserialize_with = "error_message")]
    error: Option<String>,
    #[serde(default, alias = "started_at")]
    started_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "finished_at")]
    finished_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "created_at")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at")]
    updated_at: Option<DateTime<Utc>>,
}

/// Errors arrive as a string or as `{ "message": .. }`.
fn error_message<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Object(map)) => match map.get("message").and_then(Value::as_str) {
            Some(message) => Some(message.to_string()),
            None => Some(Value::Object(map).to_string()),
        },
        Some(other) => Some(other.to_string()),
    })
}

impl TryFrom<ExecutorJobWire> for ExecutorJob {
    type Error = ValidationError;

    fn try_from(wire: ExecutorJobWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            platform: super::required(Self::NAME, "platform", wire.platform)?,
            action: super::required(Self::NAME, "action", wire.action)?,
            payload: wire.payload,
            status: wire.status,
            result: wire.result,
            error: wire.error,
            started_at: wire.started_at,
            finished_at: wire.finished_at,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

impl Resource for ExecutorJob {
    const NAME: &'static str = "executor job";
    const PATH: &'static str = "social-network-executor-jobs";

    fn decode(value: Value) -> Result<Self, ValidationError> {
        decode_via::<ExecutorJobWire, _>(Self::NAME, value)
    }
}

/// Body for creating a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewJob {
    /// Target platform.
    pub platform: String,
    /// Action to perform.
    pub action: String,
    /// Action arguments.
    pub payload: Value,
}

impl NewJob {
    /// Creates a job request with an empty payload.
    pub fn new(platform: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            action: action.into(),
            payload: json!({}),
        }
    }

    /// Sets the payload.
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Client for the executor job queue.
#[derive(Debug, Clone, Copy)]
pub struct JobClient<'a> {
    client: &'a ApiClient,
}

impl<'a> JobClient<'a> {
    /// Creates a job client over `client`.
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Queues a new job.
    ///
    /// ## Errors
    ///
    /// Returns request, status and decoding errors.
    #[instrument(skip(self))]
    pub async fn create(&self, job: &NewJob) -> Result<ExecutorJob, ApiError> {
        let config = RequestConfig::new().json(job)?;
        let value = self
            .client
            .post::<JsonFormat<Value>>(ExecutorJob::PATH, config)
            .await?
            .into_data()?;
        Ok(ExecutorJob::decode(unwrap_data(value))?)
    }

    /// Fetches one job.
    ///
    /// ## Errors
    ///
    /// Returns request, status and decoding errors.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &RecordId) -> Result<ExecutorJob, ApiError> {
        let value = self
            .client
            .get::<JsonFormat<Value>>(&format!("{}/{id}", ExecutorJob::PATH), RequestConfig::new())
            .await?
            .into_data()?;
        Ok(ExecutorJob::decode(unwrap_data(value))?)
    }

    /// Lists jobs in `status`.
    ///
    /// ## Errors
    ///
    /// Returns request, status and decoding errors.
    #[instrument(skip(self))]
    pub async fn list_by_status(
        &self,
        status: JobStatus,
        query: &ListQuery,
    ) -> Result<Page<ExecutorJob>, ApiError> {
        let query = query.clone().filter("status", status);
        super::ResourceClient::<ExecutorJob>::new(self.client)
            .list(&query)
            .await
    }

    /// Moves `job` to `status`.
    ///
    /// ## Errors
    ///
    /// Returns [`ValidationError::InvalidTransition`] without contacting the
    /// server when the lifecycle forbids the move, otherwise request, status
    /// and decoding errors.
    #[instrument(skip(self, job), fields(job.id = %job.id, from = %job.status))]
    pub async fn update_status(
        &self,
        job: &ExecutorJob,
        status: JobStatus,
    ) -> Result<ExecutorJob, ApiError> {
        if !job.status.can_transition_to(status) {
            return Err(ValidationError::InvalidTransition {
                from: job.status.to_string(),
                to: status.to_string(),
            }
            .into());
        }

        let config = RequestConfig::new().json(&json!({ "status": status }))?;
        let value = self
            .client
            .patch::<JsonFormat<Value>>(&format!("{}/{}/status", ExecutorJob::PATH, job.id), config)
            .await?
            .into_data()?;
        let updated = ExecutorJob::decode(unwrap_data(value))?;
        info!(to = %updated.status, "job status updated");
        Ok(updated)
    }
}
