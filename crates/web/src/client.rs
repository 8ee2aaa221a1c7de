//! Stateless client for the books JSON API.

use std::time::Duration;

use readinglist_app::{Book, CreateBook};
use readinglist_http::envelope::Envelope;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to the books API failed")]
    Transport(#[from] reqwest::Error),

    #[error("books API answered with unexpected status {0}")]
    UnexpectedStatus(StatusCode),

    #[error("books API returned a malformed envelope")]
    MalformedEnvelope(#[source] Option<serde_json::Error>),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::UnexpectedStatus(StatusCode::NOT_FOUND))
    }
}

/// Talks to the `/v1/books` collection at `endpoint`.
#[derive(Debug, Clone)]
pub struct ReadingListClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ReadingListClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, endpoint))
    }

    /// Wrap an existing reqwest client
    pub fn with_client(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { http, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn get_all(&self) -> Result<Vec<Book>, ClientError> {
        let response = self.http.get(&self.endpoint).send().await?;
        match Self::read_envelope(response).await? {
            Envelope::Books(books) => Ok(books),
            _ => Err(ClientError::MalformedEnvelope(None)),
        }
    }

    pub async fn get(&self, id: i64) -> Result<Book, ClientError> {
        let url = format!("{}/{}", self.endpoint, id);
        let response = self.http.get(url).send().await?;
        match Self::read_envelope(response).await? {
            Envelope::Book(book) => Ok(book),
            _ => Err(ClientError::MalformedEnvelope(None)),
        }
    }

    /// POST a new book; anything but 201 Created is a failure.
    pub async fn create(&self, book: &CreateBook) -> Result<Book, ClientError> {
        let response = self.http.post(&self.endpoint).json(book).send().await?;

        if response.status() != StatusCode::CREATED {
            tracing::warn!(status = %response.status(), "books API rejected create");
            return Err(ClientError::UnexpectedStatus(response.status()));
        }

        match Self::decode(response).await? {
            Envelope::Book(book) => Ok(book),
            _ => Err(ClientError::MalformedEnvelope(None)),
        }
    }

    async fn read_envelope(response: reqwest::Response) -> Result<Envelope<Book>, ClientError> {
        if !response.status().is_success() {
            return Err(ClientError::UnexpectedStatus(response.status()));
        }
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Envelope<Book>, ClientError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| ClientError::MalformedEnvelope(Some(err)))
    }
}
