//! Error payload interpretation.
//!
//! The API reports failures in several shapes depending on which layer
//! produced them: `{ message }`, `{ error }`, problem-details `{ detail,
//! title }`, or a per-field validation map under `errorMessages` or `errors`.
//! Field values may be a single string or a list of strings.

use serde_json::Value;
use tracing::debug;

/// Keys that may hold a top-level message, in priority order.
const MESSAGE_KEYS: [&str; 4] = ["message", "error", "detail", "title"];

/// Keys that may hold a per-field validation map.
const FIELD_MAP_KEYS: [&str; 2] = ["errorMessages", "errors"];

/// Parses an error body as JSON.
///
/// Empty and malformed bodies yield `None`; the parse failure is logged at
/// debug level and never propagated.
pub fn parse(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "error body is not JSON");
            None
        }
    }
}

/// Returns every message in the payload's per-field validation map, in key
/// order.
pub fn field_messages(payload: &Value) -> Vec<String> {
    let Some(map) = FIELD_MAP_KEYS
        .iter()
        .find_map(|key| payload.get(key).and_then(Value::as_object))
    else {
        return Vec::new();
    };

    map.values().flat_map(strings).collect()
}

/// Chooses the user-facing message for a failed response.
///
/// Priority: `message`, `error`, `detail`, `title`, then the validation map's
/// messages, then a fallback for the status code.
pub fn select_message(payload: Option<&Value>, status: u16) -> String {
    if let Some(payload) = payload {
        for key in MESSAGE_KEYS {
            let found = payload.get(key).map(strings).unwrap_or_default();
            if !found.is_empty() {
                return found.join("; ");
            }
        }

        let fields = field_messages(payload);
        if !fields.is_empty() {
            return fields.join("; ");
        }

        if let Some(text) = payload.as_str().filter(|s| !s.trim().is_empty()) {
            return text.to_string();
        }
    }

    fallback_message(status)
}

/// Returns the message used when the payload carries none.
pub fn fallback_message(status: u16) -> String {
    match status {
        400 => "The request was invalid.".to_string(),
        401 => "Your session has expired. Please sign in again.".to_string(),
        403 => "You do not have permission to perform this action.".to_string(),
        404 => "The requested resource was not found.".to_string(),
        409 => "The resource was changed by someone else.".to_string(),
        422 => "Some fields are invalid.".to_string(),
        429 => "Too many requests. Please slow down.".to_string(),
        500..=599 => crate::notify::SERVER_ERROR_MESSAGE.to_string(),
        _ => format!("Request failed with status {status}"),
    }
}

fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_takes_priority() {
        let payload = json!({ "message": "Bad email", "error": "Bad Request", "title": "x" });
        assert_eq!(select_message(Some(&payload), 400), "Bad email");
    }

    #[test]
    fn falls_through_error_detail_title() {
        assert_eq!(select_message(Some(&json!({ "error": "Nope" })), 400), "Nope");
        assert_eq!(select_message(Some(&json!({ "detail": "Gone" })), 410), "Gone");
        assert_eq!(select_message(Some(&json!({ "title": "Conflict" })), 409), "Conflict");
    }

    #[test]
    fn message_list_is_joined() {
        let payload = json!({ "message": ["email must be an email", "password is too short"] });
        assert_eq!(
            select_message(Some(&payload), 400),
            "email must be an email; password is too short"
        );
    }

    #[test]
    fn validation_map_is_used_after_message_keys() {
        let payload = json!({ "errorMessages": { "email": ["already taken"], "name": "required" } });
        assert_eq!(select_message(Some(&payload), 422), "already taken; required");
    }

    #[test]
    fn status_fallback_when_payload_is_useless() {
        assert_eq!(select_message(None, 404), "The requested resource was not found.");
        assert_eq!(
            select_message(Some(&json!({ "message": "" })), 503),
            crate::notify::SERVER_ERROR_MESSAGE
        );
        assert_eq!(select_message(None, 418), "Request failed with status 418");
    }

    #[test]
    fn field_messages_accepts_both_map_keys() {
        let a = json!({ "errorMessages": { "email": ["already taken"] } });
        let b = json!({ "errors": { "email": "emailAlreadyExists", "name": ["too long", "invalid"] } });
        assert_eq!(field_messages(&a), vec!["already taken"]);
        assert_eq!(field_messages(&b), vec!["emailAlreadyExists", "too long", "invalid"]);
        assert!(field_messages(&json!({ "errors": ["flat"] })).is_empty());
    }

    #[test]
    fn parse_tolerates_garbage() {
        assert!(parse(b"").is_none());
        assert!(parse(b"<html>oops</html>").is_none());
        assert_eq!(parse(br#"{"a":1}"#), Some(json!({ "a": 1 })));
    }
}
