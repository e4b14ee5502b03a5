//! How a success body becomes a value.
//!
//! The console asks for one of three body kinds: `json` (the default), `text`
//! and `blob`. Each is a zero-sized [`ResponseFormat`] type passed as a type
//! parameter to the generic client, so the output type follows from the call.

use std::future::Future;
use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::ValidationError;

/// Parsing strategy for a non-empty success body.
///
/// ## Examples
///
/// ```rust,ignore
/// use socialdesk_lib::response::{JsonFormat, PlainTextFormat};
///
/// let user = client.get::<JsonFormat<UserModel>>("auth/me", config).await?;
/// let csv = client.get::<PlainTextFormat>("accounts/export", config).await?;
/// ```
pub trait ResponseFormat: Send + Sync {
    /// Value produced from the body.
    type Output: Send + Sync;

    /// Parses `body`; empty bodies never reach this.
    fn parse(body: Bytes) -> impl Future<Output = Result<Self::Output, ValidationError>> + Send;

    /// `Accept` header sent with the request.
    fn content_type() -> &'static str;
}

/// `json`: deserializes the body into `T`.
#[derive(Debug, Clone, Copy)]
pub struct JsonFormat<T>(PhantomData<T>);

impl<T> ResponseFormat for JsonFormat<T>
where
    T: DeserializeOwned + Send + Sync,
{
    type Output = T;

    async fn parse(body: Bytes) -> Result<T, ValidationError> {
        Ok(serde_json::from_slice(&body)?)
    }

    fn content_type() -> &'static str {
        "application/json"
    }
}

/// `text`: the body as a UTF-8 string.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFormat;

impl ResponseFormat for PlainTextFormat {
    type Output = String;

    async fn parse(body: Bytes) -> Result<String, ValidationError> {
        String::from_utf8(body.into()).map_err(|e| ValidationError::ContentTypeMismatch {
            expected: "UTF-8 text".to_string(),
            actual: format!("{} undecodable bytes", e.as_bytes().len()),
        })
    }

    fn content_type() -> &'static str {
        "text/plain"
    }
}

/// `blob`: the raw bytes, e.g. media downloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryFormat;

impl ResponseFormat for BinaryFormat {
    type Output = Bytes;

    async fn parse(body: Bytes) -> Result<Bytes, ValidationError> {
        Ok(body)
    }

    fn content_type() -> &'static str {
        "*/*"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserModel;

    #[tokio::test]
    async fn json_decodes_into_the_requested_type() {
        let body = Bytes::from_static(br#"{"id":3,"email":"ops@example.com"}"#);
        let user = JsonFormat::<UserModel>::parse(body).await.unwrap();
        assert_eq!(user.email.as_deref(), Some("ops@example.com"));
    }

    #[tokio::test]
    async fn json_reports_malformed_bodies() {
        let err = JsonFormat::<UserModel>::parse(Bytes::from_static(b"<html>"))
            .await
            .unwrap_err();
        assert!(err.is_parse_error());
    }

    #[tokio::test]
    async fn text_requires_utf8() {
        assert_eq!(
            PlainTextFormat::parse(Bytes::from_static(b"id,username\n1,ada"))
                .await
                .unwrap(),
            "id,username\n1,ada"
        );
        assert!(matches!(
            PlainTextFormat::parse(Bytes::from_static(&[0xc3, 0x28])).await,
            Err(ValidationError::ContentTypeMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn blob_is_untouched() {
        let png = Bytes::from_static(&[0x89, b'P', b'N', b'G']);
        assert_eq!(BinaryFormat::parse(png.clone()).await.unwrap(), png);
    }
}
