//! Social network accounts driven by the executor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode_via, flat_or_nested, required, NestedRef, RecordId, Resource};
use crate::error::ValidationError;

/// A managed social network account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// Record id.
    pub id: RecordId,
    /// Handle on the platform.
    pub username: String,
    /// Platform name, e.g. `instagram`.
    pub platform: Option<String>,
    /// Profile display name.
    pub display_name: Option<String>,
    /// Account status as reported by the server.
    pub status: Option<String>,
    /// Proxy the account connects through.
    pub proxy_id: Option<RecordId>,
    /// Category the account belongs to.
    pub category_id: Option<RecordId>,
    /// Browser context used when driving the account.
    pub browser_context_id: Option<RecordId>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountWire {
    id: RecordId,
    #[serde(default, alias = "userName", alias = "handle")]
    username: Option<String>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default, alias = "display_name")]
    display_name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "proxy_id")]
    proxy_id: Option<RecordId>,
    #[serde(default)]
    proxy: Option<NestedRef>,
    #[serde(default, alias = "category_id")]
    category_id: Option<RecordId>,
    #[serde(default)]
    category: Option<NestedRef>,
    #[serde(default, alias = "browser_context_id")]
    browser_context_id: Option<RecordId>,
    #[serde(default)]
    browser_context: Option<NestedRef>,
    #[serde(default, alias = "created_at")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at")]
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<AccountWire> for Account {
    type Error = ValidationError;

    fn try_from(wire: AccountWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            username: required(Self::NAME, "username", wire.username)?,
            platform: wire.platform,
            display_name: wire.display_name,
            status: wire.status,
            proxy_id: flat_or_nested(wire.proxy_id, wire.proxy),
            category_id: flat_or_nested(wire.category_id, wire.category),
            browser_context_id: flat_or_nested(wire.browser_context_id, wire.browser_context),
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        })
    }
}

impl Resource for Account {
    const NAME: &'static str = "account";
    const PATH: &'static str = "accounts";

    fn decode(value: Value) -> Result<Self, ValidationError> {
        decode_via::<AccountWire, _>(Self::NAME, value)
    }
}
