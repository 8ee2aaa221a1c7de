//! Uniform JSON response envelopes.
//!
//! Every successful API body is a single object keyed by one of `book`,
//! `books` or `message`, tab-indented and terminated by one newline.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The closed set of top-level response shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope<T> {
    Book(T),
    Books(Vec<T>),
    Message(String),
}

impl<T> Envelope<T> {
    pub fn message(text: impl Into<String>) -> Self {
        Envelope::Message(text.into())
    }
}

/// Serialize `value` the way every response body is laid out.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::with_capacity(256);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

/// Build a JSON response. The body is fully rendered before any part of the
/// response exists, so a serialization failure leaves nothing half written.
pub fn write_json<T: Serialize + ?Sized>(
    status: StatusCode,
    value: &T,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let body = render_json(value)
        .map_err(|err| AppError::Internal(anyhow::Error::new(err).context("encoding response")))?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let response_headers = response.headers_mut();
    for (name, value) in headers.iter() {
        response_headers.append(name.clone(), value.clone());
    }
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Ok(response)
}

/// Write an [`Envelope`] with the given status and extra headers.
pub fn write_envelope<T: Serialize>(
    status: StatusCode,
    envelope: &Envelope<T>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    write_json(status, envelope, headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde_json::json;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn envelope_serializes_under_named_key() {
        let book = Envelope::Book(json!({"id": 1}));
        assert_eq!(serde_json::to_value(&book).unwrap(), json!({"book": {"id": 1}}));

        let books: Envelope<serde_json::Value> = Envelope::Books(vec![]);
        assert_eq!(serde_json::to_value(&books).unwrap(), json!({"books": []}));

        let message: Envelope<()> = Envelope::message("book successfully deleted");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"message": "book successfully deleted"})
        );
    }

    #[test]
    fn envelope_round_trips_through_deserialize() {
        let parsed: Envelope<serde_json::Value> =
            serde_json::from_str(r#"{"books":[{"id":1},{"id":2}]}"#).unwrap();
        assert_eq!(
            parsed,
            Envelope::Books(vec![json!({"id": 1}), json!({"id": 2})])
        );
    }

    #[test]
    fn rendered_body_is_indented_with_one_trailing_newline() {
        let text = String::from_utf8(render_json(&Envelope::Book(json!({"id": 7}))).unwrap())
            .unwrap();
        assert_eq!(text, "{\n\t\"book\": {\n\t\t\"id\": 7\n\t}\n}\n");
        assert!(!text.ends_with("\n\n"));
    }

    #[tokio::test]
    async fn write_envelope_sets_status_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::LOCATION, HeaderValue::from_static("/v1/books/3"));

        let response =
            write_envelope(StatusCode::CREATED, &Envelope::Book(json!({"id": 3})), headers)
                .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/v1/books/3");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let text = body_text(response).await;
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn extra_headers_cannot_override_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let response = write_json(StatusCode::OK, &json!({}), headers).unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot encode"))
        }
    }

    #[test]
    fn serialization_failure_is_internal_error() {
        let err = write_envelope(
            StatusCode::OK,
            &Envelope::Book(Unserializable),
            HeaderMap::new(),
        )
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
