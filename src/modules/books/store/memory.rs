use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{BookStore, StoreError};
use crate::modules::books::models::Book;

/// Process-local store. The write lock makes the version check and the write
/// a single step, so concurrent updates behave like the SQL store.
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: i64,
    books: BTreeMap<i64, Book>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn get_all(&self) -> Result<Vec<Book>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.books.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Book, StoreError> {
        let inner = self.inner.read().await;
        inner.books.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn insert(&self, draft: Book) -> Result<Book, StoreError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;

        let book = Book {
            id: inner.last_id,
            created_at: OffsetDateTime::now_utc(),
            version: 1,
            ..draft
        };
        inner.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn update(&self, book: Book) -> Result<Book, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner.books.get_mut(&book.id).ok_or(StoreError::NotFound)?;

        if stored.version != book.version {
            return Err(StoreError::Conflict);
        }

        stored.title = book.title;
        stored.published = book.published;
        stored.pages = book.pages;
        stored.genres = book.genres;
        stored.rating = book.rating;
        stored.version += 1;

        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
