//! Strict JSON request decoding.
//!
//! A request body is accepted only when it is at most [`MAX_BODY_BYTES`] long
//! and holds exactly one JSON value that deserializes into the target shape.
//! Target shapes are expected to carry `#[serde(deny_unknown_fields)]`; the
//! resulting error is reported as [`DecodeError::UnknownField`].

use axum::{
    body::Body,
    extract::{FromRequest, Request},
};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use thiserror::Error;

use crate::error::AppError;

/// Largest request body the API will read.
pub const MAX_BODY_BYTES: usize = 1_048_576;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("body must not be larger than {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("{0}")]
    MalformedBody(String),

    #[error("body contains unknown key \"{0}\"")]
    UnknownField(String),

    #[error("body must only contain a single JSON value")]
    TrailingData,
}

impl DecodeError {
    /// Machine-readable code used in error responses.
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::PayloadTooLarge { .. } => "payload_too_large",
            DecodeError::MalformedBody(_) => "malformed_body",
            DecodeError::UnknownField(_) => "unknown_field",
            DecodeError::TrailingData => "trailing_data",
        }
    }
}

/// Read a body into memory, failing as soon as more than `limit` bytes arrive.
pub async fn read_limited(body: Body, limit: usize) -> Result<Vec<u8>, DecodeError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| {
            tracing::debug!(error = %err, "request body stream failed");
            DecodeError::MalformedBody("body could not be read".to_string())
        })?;

        if buf.len() + chunk.len() > limit {
            return Err(DecodeError::PayloadTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}

/// Decode exactly one JSON value from `bytes`.
pub fn decode_strict<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::MalformedBody(
            "body must not be empty".to_string(),
        ));
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value: T = serde::Deserialize::deserialize(&mut de).map_err(classify)?;

    // `end` only tolerates trailing whitespace.
    de.end().map_err(|_| DecodeError::TrailingData)?;

    Ok(value)
}

/// Read and decode a body in one step.
pub async fn decode_body<T: DeserializeOwned>(body: Body, limit: usize) -> Result<T, DecodeError> {
    let bytes = read_limited(body, limit).await?;
    decode_strict(&bytes)
}

fn classify(err: serde_json::Error) -> DecodeError {
    let (line, column) = (err.line(), err.column());

    match err.classify() {
        Category::Data => {
            let text = err.to_string();
            match unknown_field_name(&text) {
                Some(field) => DecodeError::UnknownField(field.to_string()),
                None => DecodeError::MalformedBody(format!(
                    "body contains incorrect JSON (at line {line}, column {column}): {}",
                    strip_position(&text)
                )),
            }
        }
        Category::Eof => DecodeError::MalformedBody("body contains badly-formed JSON".to_string()),
        Category::Syntax | Category::Io => DecodeError::MalformedBody(format!(
            "body contains badly-formed JSON (at line {line}, column {column})"
        )),
    }
}

/// serde reports unknown keys as "unknown field `name`, expected ...".
///
/// serde exposes no structured form of this error, so the name is taken from
/// the message wording of `serde::de::Error::unknown_field`. If that wording
/// changes the body is still rejected, as [`DecodeError::MalformedBody`].
fn unknown_field_name(message: &str) -> Option<&str> {
    message
        .strip_prefix("unknown field `")
        .and_then(|rest| rest.split('`').next())
}

fn strip_position(message: &str) -> &str {
    match message.rfind(" at line ") {
        Some(idx) => &message[..idx],
        None => message,
    }
}

/// Extractor that strictly decodes the request body into `T`.
#[derive(Debug, Clone)]
pub struct StrictJson<T>(pub T);

impl<T, S> FromRequest<S> for StrictJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let value = decode_body(req.into_body(), MAX_BODY_BYTES).await?;
        Ok(StrictJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Shape {
        title: Option<String>,
        pages: Option<i32>,
    }

    #[test]
    fn decodes_single_object() {
        let shape: Shape = decode_strict(br#" {"title":"A","pages":3} "#).unwrap();
        assert_eq!(
            shape,
            Shape {
                title: Some("A".to_string()),
                pages: Some(3)
            }
        );
    }

    #[test]
    fn rejects_unknown_field() {
        let err = decode_strict::<Shape>(br#"{"title":"A","foo":1}"#).unwrap_err();
        assert_eq!(err, DecodeError::UnknownField("foo".to_string()));
    }

    #[test]
    fn unknown_field_wording_matches_serde() {
        let err = serde_json::from_str::<Shape>(r#"{"genre":"x"}"#).unwrap_err();
        assert_eq!(unknown_field_name(&err.to_string()), Some("genre"));
        assert_eq!(unknown_field_name("invalid type: string"), None);
    }

    #[test]
    fn rejects_trailing_value() {
        let err = decode_strict::<Shape>(br#"{"title":"A"}{"title":"B"}"#).unwrap_err();
        assert_eq!(err, DecodeError::TrailingData);

        let err = decode_strict::<Shape>(br#"{"title":"A"} x"#).unwrap_err();
        assert_eq!(err, DecodeError::TrailingData);
    }

    #[test]
    fn rejects_empty_and_blank_bodies() {
        for body in [&b""[..], &b"  \n\t"[..]] {
            match decode_strict::<Shape>(body).unwrap_err() {
                DecodeError::MalformedBody(msg) => assert_eq!(msg, "body must not be empty"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn rejects_syntax_errors_and_type_mismatches() {
        assert!(matches!(
            decode_strict::<Shape>(br#"{"title": }"#),
            Err(DecodeError::MalformedBody(_))
        ));
        assert!(matches!(
            decode_strict::<Shape>(br#"{"title":"A""#),
            Err(DecodeError::MalformedBody(_))
        ));

        match decode_strict::<Shape>(br#"{"pages":"many"}"#).unwrap_err() {
            DecodeError::MalformedBody(msg) => assert!(msg.contains("incorrect JSON"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejects_oversized_body() {
        let mut body = br#"{"title":""#.to_vec();
        body.resize(2 * 1024 * 1024, b'a');
        body.extend_from_slice(br#""}"#);

        let err = decode_body::<Shape>(Body::from(body), MAX_BODY_BYTES)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::PayloadTooLarge {
                limit: MAX_BODY_BYTES
            }
        );
    }

    #[tokio::test]
    async fn body_exactly_at_limit_is_read() {
        let bytes = read_limited(Body::from(vec![b' '; 16]), 16).await.unwrap();
        assert_eq!(bytes.len(), 16);

        let err = read_limited(Body::from(vec![b' '; 17]), 16)
            .await
            .unwrap_err();
        assert_eq!(err, DecodeError::PayloadTooLarge { limit: 16 });
    }
}
