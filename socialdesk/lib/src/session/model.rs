//! Session and user models.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

use crate::resources::RecordId;

/// Role name that grants the admin flag.
const ADMIN_ROLE: &str = "admin";

/// The persisted auth token bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthModel {
    /// Bearer token attached to API requests.
    pub access_token: String,
    /// Token exchanged for a new bundle at `auth/refresh`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expires: Option<i64>,
    /// Token type reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl AuthModel {
    /// Creates a bundle holding only an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_expires: None,
            token_type: None,
        }
    }

    /// Sets the expiry in epoch milliseconds.
    pub fn expiring_at(mut self, epoch_ms: i64) -> Self {
        self.token_expires = Some(epoch_ms);
        self
    }

    /// Sets the refresh token.
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    /// Returns `true` when the token expires at or before `now_ms`.
    ///
    /// A bundle without an expiry never expires locally.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.token_expires.is_some_and(|expires| expires <= now_ms)
    }
}

/// A `{ id, name }` lookup such as a role or status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    /// Lookup id; some endpoints send only the name.
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Human-readable name, when provided.
    #[serde(default)]
    pub name: Option<String>,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserModel {
    /// User id.
    pub id: RecordId,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Given name.
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    /// Role lookup.
    #[serde(default)]
    pub role: Option<Lookup>,
    /// Account status lookup.
    #[serde(default)]
    pub status: Option<Lookup>,
    /// Avatar, either a URL or a file descriptor object's path.
    #[serde(default, deserialize_with = "photo_path")]
    pub photo: Option<String>,
}

impl UserModel {
    /// Returns `true` when the user's role is the admin role.
    pub fn is_admin(&self) -> bool {
        self.role
            .as_ref()
            .and_then(|role| role.name.as_deref())
            .is_some_and(|name| name.eq_ignore_ascii_case(ADMIN_ROLE))
    }

    /// Returns "First Last", falling back to the email.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        self.email.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// Token fields of a login or refresh response.
///
/// Decoding ignores every other field, so an unexpected `user` shape never
/// prevents the session from being stored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    /// Access token.
    pub token: String,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry; a number or numeric string, anything else is dropped.
    #[serde(default, deserialize_with = "lenient_epoch_millis")]
    pub token_expires: Option<i64>,
    /// Token type.
    #[serde(default)]
    pub token_type: Option<String>,
}

impl SessionTokens {
    /// Converts the tokens into the bundle the store persists.
    pub fn to_auth_model(&self) -> AuthModel {
        AuthModel {
            access_token: self.token.clone(),
            refresh_token: self.refresh_token.clone(),
            token_expires: self.token_expires,
            token_type: self.token_type.clone(),
        }
    }
}

/// Body returned by `POST auth/email/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Access token.
    pub token: String,
    /// Refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry; a number or numeric string, anything else is dropped.
    #[serde(default, deserialize_with = "lenient_epoch_millis")]
    pub token_expires: Option<i64>,
    /// Token type.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Signed-in user.
    #[serde(default)]
    pub user: Option<UserModel>,
}

impl LoginResponse {
    /// Converts the response into the bundle the store persists.
    pub fn to_auth_model(&self) -> AuthModel {
        AuthModel {
            access_token: self.token.clone(),
            refresh_token: self.refresh_token.clone(),
            token_expires: self.token_expires,
            token_type: self.token_type.clone(),
        }
    }
}

fn lenient_epoch_millis<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(epoch_millis))
}

fn epoch_millis(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        serde_json::Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

fn photo_path<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(url)) => Some(url),
        Some(serde_json::Value::Object(map)) => map
            .get("path")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        _ => None,
    })
}
