//! Page-level errors. Only the canonical status text ever reaches the browser.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::client::ClientError;

#[derive(Debug)]
pub enum PageError {
    BadRequest,
    NotFound,
    MethodNotAllowed,
    Upstream(ClientError),
}

impl From<ClientError> for PageError {
    fn from(err: ClientError) -> Self {
        if err.is_not_found() {
            PageError::NotFound
        } else {
            PageError::Upstream(err)
        }
    }
}

impl PageError {
    pub fn status(&self) -> StatusCode {
        match self {
            PageError::BadRequest => StatusCode::BAD_REQUEST,
            PageError::NotFound => StatusCode::NOT_FOUND,
            PageError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            PageError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let PageError::Upstream(err) = &self {
            tracing::error!(error = ?err, "books API call failed");
        }
        let text = status.canonical_reason().unwrap_or("Error");
        (status, format!("{text}\n")).into_response()
    }
}

pub async fn method_not_allowed() -> PageError {
    PageError::MethodNotAllowed
}
