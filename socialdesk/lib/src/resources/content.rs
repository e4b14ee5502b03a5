//! Posts queued for publishing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode_via, flat_or_nested, required, NestedRef, RecordId, Resource};
use crate::error::ValidationError;

/// A piece of content to publish.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    /// Record id.
    pub id: RecordId,
    /// Post text.
    pub text: String,
    /// Category the content is filed under.
    pub category_id: Option<RecordId>,
    /// Account that publishes the content.
    pub account_id: Option<RecordId>,
    /// Attached media URLs.
    pub media_urls: Vec<String>,
    /// Publishing status.
    pub status: Option<String>,
    /// When the content is due to be posted.
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentWire {
    id: RecordId,
    #[serde(default, alias = "body", alias = "content")]
    text: Option<String>,
    #[serde(default, alias = "category_id")]
    category_id: Option<RecordId>,
    #[serde(default)]
    category: Option<NestedRef>,
    #[serde(default, alias = "account_id")]
    account_id: Option<RecordId>,
    #[serde(default)]
    account: Option<NestedRef>,
    #[serde(default, alias = "media_urls", alias = "media")]
    media_urls: Option<Vec<String>>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "scheduled_at")]
    scheduled_at: Option<DateTime<Utc>>,
}

impl TryFrom<ContentWire> for Content {
    type Error = ValidationError;

    fn try_from(wire: ContentWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            text: required(Self::NAME, "text", wire.text)?,
            category_id: flat_or_nested(wire.category_id, wire.category),
            account_id: flat_or_nested(wire.account_id, wire.account),
            media_urls: wire.media_urls.unwrap_or_default(),
            status: wire.status,
            scheduled_at: wire.scheduled_at,
        })
    }
}

impl Resource for Content {
    const NAME: &'static str = "content";
    const PATH: &'static str = "contents";

    fn decode(value: Value) -> Result<Self, ValidationError> {
        decode_via::<ContentWire, _>(Self::NAME, value)
    }
}
