//! JSON handlers for `/v1/books`.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use readinglist_http::{
    decode::StrictJson,
    envelope::{write_envelope, Envelope},
    error::{self, AppError},
};
use readinglist_kernel::settings::EmptyGenresPolicy;

use super::{
    models::{Book, CreateBook, FieldError, UpdateBook},
    store::{BookStore, StoreError},
};

/// Everything a books handler needs, handed in through axum state.
#[derive(Clone)]
pub struct BooksState {
    pub store: Arc<dyn BookStore>,
    pub empty_genres: EmptyGenresPolicy,
}

pub fn router(state: BooksState) -> Router {
    Router::new()
        .route(
            "/",
            get(list_books)
                .post(create_book)
                .fallback(error::method_not_allowed),
        )
        .route(
            "/{id}",
            get(show_book)
                .put(update_book)
                .delete(delete_book)
                .fallback(error::method_not_allowed),
        )
        .with_state(state)
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::not_found("the requested book could not be found"),
            StoreError::Conflict => AppError::conflict(
                "unable to update the book due to an edit conflict, please try again",
            ),
            StoreError::Failure(cause) => AppError::Internal(cause),
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::bad_request(
            "invalid_id",
            format!("invalid id parameter \"{raw}\""),
        )),
    }
}

fn validation_failed(errors: Vec<FieldError>) -> AppError {
    AppError::validation(
        errors.iter().map(FieldError::to_json).collect(),
        "the book failed validation",
    )
}

async fn list_books(State(state): State<BooksState>) -> Result<Response, AppError> {
    let books = state.store.get_all().await?;
    write_envelope(StatusCode::OK, &Envelope::Books(books), HeaderMap::new())
}

async fn create_book(
    State(state): State<BooksState>,
    StrictJson(input): StrictJson<CreateBook>,
) -> Result<Response, AppError> {
    let draft = input.into_draft();
    draft.validate().map_err(validation_failed)?;

    let book = state.store.insert(draft).await?;
    tracing::info!(book_id = book.id, "book created");

    let mut headers = HeaderMap::new();
    let location = HeaderValue::from_str(&format!("/v1/books/{}", book.id))
        .map_err(|err| AppError::Internal(err.into()))?;
    headers.insert(header::LOCATION, location);

    write_envelope(StatusCode::CREATED, &Envelope::Book(book), headers)
}

async fn show_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let book = state.store.get(id).await?;
    write_envelope(StatusCode::OK, &Envelope::Book(book), HeaderMap::new())
}

async fn update_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
    StrictJson(input): StrictJson<UpdateBook>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;

    let current = state.store.get(id).await?;
    let merged: Book = input.apply_to(&current, state.empty_genres);
    merged.validate().map_err(validation_failed)?;

    let book = state.store.update(merged).await?;
    tracing::info!(book_id = book.id, version = book.version, "book updated");

    write_envelope(StatusCode::OK, &Envelope::Book(book), HeaderMap::new())
}

async fn delete_book(
    State(state): State<BooksState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    tracing::info!(book_id = id, "book deleted");

    write_envelope(
        StatusCode::OK,
        &Envelope::<Book>::message("book successfully deleted"),
        HeaderMap::new(),
    )
}
