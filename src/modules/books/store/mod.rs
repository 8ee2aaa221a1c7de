//! Persistence contract for books.
//!
//! Stores assign `id`, `created_at` and `version` themselves. `update` is
//! optimistic: it only succeeds when the caller presents the version that is
//! currently stored, and bumps it by exactly one. Stores never retry.

mod memory;
mod postgres;

pub use memory::MemoryBookStore;
pub use postgres::PgBookStore;

use async_trait::async_trait;
use thiserror::Error;

use super::models::Book;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("edit conflict: record was modified concurrently")]
    Conflict,

    #[error("store failure")]
    Failure(#[source] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Failure(other.into()),
        }
    }
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Every live book, ordered by id.
    async fn get_all(&self) -> Result<Vec<Book>, StoreError>;

    async fn get(&self, id: i64) -> Result<Book, StoreError>;

    /// Persist `draft`, ignoring its id, timestamp and version.
    async fn insert(&self, draft: Book) -> Result<Book, StoreError>;

    /// Persist every mutable field of `book` if `book.version` is current.
    async fn update(&self, book: Book) -> Result<Book, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}
