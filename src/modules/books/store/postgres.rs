use async_trait::async_trait;
use sqlx::{postgres::PgPool, FromRow};
use time::OffsetDateTime;

use super::{BookStore, StoreError};
use crate::modules::books::models::Book;

const COLUMNS: &str = "id, created_at, title, published, pages, genres, rating, version";

/// Books persisted in PostgreSQL. Unset optional fields are stored as NULL.
#[derive(Debug, Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[derive(Debug, FromRow)]
struct BookRow {
    id: i64,
    created_at: OffsetDateTime,
    title: String,
    published: Option<i32>,
    pages: Option<i32>,
    genres: Vec<String>,
    rating: Option<f32>,
    version: i32,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            created_at: row.created_at,
            title: row.title,
            published: row.published,
            pages: row.pages,
            genres: row.genres,
            rating: row.rating,
            version: row.version,
        }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn get_all(&self) -> Result<Vec<Book>, StoreError> {
        let rows: Vec<BookRow> = sqlx::query_as(&format!("SELECT {COLUMNS} FROM books ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn get(&self, id: i64) -> Result<Book, StoreError> {
        let row: BookRow = sqlx::query_as(&format!("SELECT {COLUMNS} FROM books WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn insert(&self, draft: Book) -> Result<Book, StoreError> {
        let row: BookRow = sqlx::query_as(&format!(
            "INSERT INTO books (title, published, pages, genres, rating) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        ))
        .bind(draft.title)
        .bind(draft.published)
        .bind(draft.pages)
        .bind(draft.genres)
        .bind(draft.rating)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(book_id = row.id, "book inserted");
        Ok(row.into())
    }

    async fn update(&self, book: Book) -> Result<Book, StoreError> {
        let (id, expected_version) = (book.id, book.version);

        let row: Option<BookRow> = sqlx::query_as(&format!(
            "UPDATE books \
             SET title = $1, published = $2, pages = $3, genres = $4, rating = $5, \
                 version = version + 1 \
             WHERE id = $6 AND version = $7 \
             RETURNING {COLUMNS}"
        ))
        .bind(book.title)
        .bind(book.published)
        .bind(book.pages)
        .bind(book.genres)
        .bind(book.rating)
        .bind(id)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into()),
            // Nothing matched: either the row is gone or someone else won the race.
            None if self.exists(id).await? => {
                tracing::debug!(book_id = id, expected_version, "stale version on update");
                Err(StoreError::Conflict)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
