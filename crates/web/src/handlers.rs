//! HTML pages rendered from the books API.

use std::fmt::Write as _;

use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Form,
};
use readinglist_app::{Book, CreateBook};
use serde::Deserialize;

use crate::{error::PageError, WebState};

pub async fn home(State(state): State<WebState>) -> Result<Html<String>, PageError> {
    let books = state.client.get_all().await?;

    let mut page = String::from(
        "<html><head><title>Reading List</title></head><body><h1>Reading List</h1><ul>",
    );
    for book in &books {
        let _ = write!(page, "<li>{}</li>", summary(book));
    }
    page.push_str("</ul></body></html>");

    Ok(Html(page))
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    id: Option<String>,
}

pub async fn book_view(
    State(state): State<WebState>,
    Query(query): Query<ViewQuery>,
) -> Result<String, PageError> {
    let id = query
        .id
        .as_deref()
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|id| *id >= 1)
        .ok_or(PageError::NotFound)?;

    let book = state.client.get(id).await?;
    Ok(format!("{} ({})\n", book.title, book.pages.unwrap_or(0)))
}

pub async fn book_create_form() -> Html<&'static str> {
    Html(concat!(
        "<html><head><title>Create Book</title></head>",
        "<body><h1>Create Book</h1><form action=\"/book/create\" method=\"post\">",
        "<label for=\"title\">Title</label><input type=\"text\" name=\"title\" id=\"title\">",
        "<label for=\"pages\">Pages</label><input type=\"number\" name=\"pages\" id=\"pages\">",
        "<label for=\"published\">Published</label><input type=\"number\" name=\"published\" id=\"published\">",
        "<label for=\"genres\">Genres</label><input type=\"text\" name=\"genres\" id=\"genres\">",
        "<label for=\"rating\">Rating</label><input type=\"number\" step=\"0.1\" name=\"rating\" id=\"rating\">",
        "<button type=\"submit\">Create</button></form></body></html>",
    ))
}

/// Raw form fields; parsed by hand so every failure is a plain 400.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateForm {
    title: String,
    pages: String,
    published: String,
    genres: String,
    rating: String,
}

impl CreateForm {
    pub fn parse(self) -> Result<CreateBook, PageError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(PageError::BadRequest);
        }

        let positive = |raw: &str| {
            raw.trim()
                .parse::<i32>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or(PageError::BadRequest)
        };
        let pages = positive(&self.pages)?;
        let published = positive(&self.published)?;

        let rating = self
            .rating
            .trim()
            .parse::<f32>()
            .map_err(|_| PageError::BadRequest)?;

        let genres: Vec<String> = self.genres.split_whitespace().map(str::to_string).collect();

        Ok(CreateBook {
            title: title.to_string(),
            published: Some(published),
            pages: Some(pages),
            genres: (!genres.is_empty()).then_some(genres),
            rating: Some(rating),
        })
    }
}

pub async fn book_create(
    State(state): State<WebState>,
    Form(form): Form<CreateForm>,
) -> Result<Redirect, PageError> {
    let draft = form.parse()?;
    let book = state.client.create(&draft).await.map_err(PageError::Upstream)?;
    tracing::info!(book_id = book.id, "book created through web form");
    Ok(Redirect::to("/"))
}

fn summary(book: &Book) -> String {
    format!("{} ({})", escape_html(&book.title), book.pages.unwrap_or(0))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, pages: &str, published: &str, genres: &str, rating: &str) -> CreateForm {
        CreateForm {
            title: title.to_string(),
            pages: pages.to_string(),
            published: published.to_string(),
            genres: genres.to_string(),
            rating: rating.to_string(),
        }
    }

    #[test]
    fn form_parses_into_create_body() {
        let body = form("Dune", "412", "1965", "SciFi  Classic", "4.5")
            .parse()
            .unwrap();
        assert_eq!(body.title, "Dune");
        assert_eq!(body.pages, Some(412));
        assert_eq!(body.published, Some(1965));
        assert_eq!(
            body.genres,
            Some(vec!["SciFi".to_string(), "Classic".to_string()])
        );
        assert_eq!(body.rating, Some(4.5));
    }

    #[test]
    fn form_rejects_bad_fields() {
        let cases = [
            form("", "10", "2000", "", "3"),
            form("T", "0", "2000", "", "3"),
            form("T", "ten", "2000", "", "3"),
            form("T", "10", "-1", "", "3"),
            form("T", "10", "2000", "", "great"),
        ];
        for case in cases {
            assert!(matches!(case.parse(), Err(PageError::BadRequest)));
        }
    }

    #[test]
    fn titles_are_escaped() {
        let book = Book {
            pages: Some(12),
            ..Book::draft("<b>Tom & Jerry</b>")
        };
        assert_eq!(
            summary(&book),
            "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt; (12)"
        );
    }
}
