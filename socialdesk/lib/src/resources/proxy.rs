//! Outbound proxies assigned to accounts and browser contexts.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode_via, required, RecordId, Resource};
use crate::error::ValidationError;

/// An HTTP or SOCKS proxy.
///
/// The password is never serialized back out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proxy {
    /// Record id.
    pub id: RecordId,
    /// Host name or IP address.
    pub host: String,
    /// Port, when the server sent a valid one.
    pub port: Option<u16>,
    /// `http`, `https`, `socks5`...
    pub protocol: Option<String>,
    /// Proxy auth user.
    pub username: Option<String>,
    /// Proxy auth password; never serialized.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Exit country code.
    pub country: Option<String>,
    /// Health status as reported by the server.
    pub status: Option<String>,
}

impl Proxy {
    /// Returns `protocol://host:port`, omitting the parts that are unknown.
    pub fn address(&self) -> String {
        let mut address = match &self.protocol {
            Some(protocol) => format!("{protocol}://{}", self.host),
            None => self.host.clone(),
        };
        if let Some(port) = self.port {
            address.push_str(&format!(":{port}"));
        }
        address
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyWire {
    id: RecordId,
    #[serde(default, alias = "ip", alias = "address")]
    host: Option<String>,
    #[serde(default, deserialize_with = "lenient_port")]
    port: Option<u16>,
    #[serde(default, alias = "type", alias = "scheme")]
    protocol: Option<String>,
    #[serde(default, alias = "user")]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default, alias = "countryCode", alias = "country_code")]
    country: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Accepts a port as a number or a numeric string; anything else is dropped.
fn lenient_port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl TryFrom<ProxyWire> for Proxy {
    type Error = ValidationError;

    fn try_from(wire: ProxyWire) -> Result<Self, Self::Error> {
        Ok(Self {
            id: wire.id,
            host: required(Self::NAME, "host", wire.host)?,
            port: wire.port,
            protocol: wire.protocol,
            username: wire.username,
            password: wire.password,
            country: wire.country,
            status: wire.status,
        })
    }
}

impl Resource for Proxy {
    const NAME: &'static str = "proxy";
    const PATH: &'static str = "proxies";

    fn decode(value: Value) -> Result<Self, ValidationError> {
        decode_via::<ProxyWire, _>(Self::NAME, value)
    }
}
