//! Accounts watched on Threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode_via, required, RecordId, Resource};
use crate::error::ValidationError;

/// An external account on the Threads watchlist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistAccount {
    /// Record id.
    pub id: RecordId,
    /// Watched handle.
    pub username: String,
    /// Platform the handle lives on.
    pub platform: Option<String>,
    /// Operator note.
    pub note: Option<String>,
    /// When the handle was added.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WatchlistWire {
    id: RecordId,
    #[serde(default, alias = "handle", alias = "userName")]
    username: Option<String>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default, alias = "notes")]
    note: Option<String>,
    #[serde(default, alias = "created_at")]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<WatchlistWire> for WatchlistAccount {
    type Error = ValidationError;

    fn try_from(wire: WatchlistWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            username: required(Self::NAME, "username", wire.username)?,
            platform: wire.platform,
            note: wire.note,
            created_at: wire.created_at,
        })
    }
}

impl Resource for WatchlistAccount {
    const NAME: &'static str = "watchlist account";
    const PATH: &'static str = "threads/watchlist/accounts";

    fn decode(value: Value) -> Result<Self, ValidationError> {
        decode_via::<WatchlistWire, _>(Self::NAME, value)
    }
}
