//! Browser fingerprints the executor runs accounts under.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode_via, flat_or_nested, required, NestedRef, RecordId, Resource};
use crate::error::ValidationError;

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A browser context: user agent, viewport, locale and proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserContext {
    /// Record id.
    pub id: RecordId,
    /// Context name.
    pub name: String,
    /// User agent string sent by the browser.
    pub user_agent: Option<String>,
    /// Window size.
    pub viewport: Option<Viewport>,
    /// Locale such as `en-US`.
    pub locale: Option<String>,
    /// IANA timezone name.
    pub timezone: Option<String>,
    /// Proxy the context routes through.
    pub proxy_id: Option<RecordId>,
    /// Account that owns the context.
    pub account_id: Option<RecordId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrowserContextWire {
    id: RecordId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "user_agent")]
    user_agent: Option<String>,
    #[serde(default)]
    viewport: Option<Viewport>,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default, alias = "timezoneId", alias = "timezone_id")]
    timezone: Option<String>,
    #[serde(default, alias = "proxy_id")]
    proxy_id: Option<RecordId>,
    #[serde(default)]
    proxy: Option<NestedRef>,
    #[serde(default, alias = "account_id")]
    account_id: Option<RecordId>,
    #[serde(default)]
    account: Option<NestedRef>,
}

impl TryFrom<BrowserContextWire> for BrowserContext {
    type Error = ValidationError;

    fn try_from(wire: BrowserContextWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            name: required(Self::NAME, "name", wire.name)?,
            user_agent: wire.user_agent,
            viewport: wire.viewport,
            locale: wire.locale,
            timezone: wire.timezone,
            proxy_id: flat_or_nested(wire.proxy_id, wire.proxy),
            account_id: flat_or_nested(wire.account_id, wire.account),
        })
    }
}

impl Resource for BrowserContext {
    const NAME: &'static str = "browser context";
    const PATH: &'static str = "browser-contexts";

    fn decode(value: Value) -> Result<Self, ValidationError> {
        decode_via::<BrowserContextWire, _>(Self::NAME, value)
    }
}
