use readinglist_kernel::settings::EmptyGenresPolicy;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

/// Highest rating a book can carry.
pub const MAX_RATING: f32 = 5.0;

/// A book on the reading list.
///
/// `created_at` and `version` belong to the store and never appear in JSON.
/// Optional numeric fields are omitted from JSON when unset or zero, and
/// `pages` travels as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    #[serde(skip, default = "unix_epoch")]
    pub created_at: OffsetDateTime,
    pub title: String,
    #[serde(default, skip_serializing_if = "is_unset")]
    pub published: Option<i32>,
    #[serde(default, skip_serializing_if = "is_unset", with = "pages_as_string")]
    pub pages: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "is_unset_rating")]
    pub rating: Option<f32>,
    #[serde(skip)]
    pub version: i32,
}

impl Book {
    /// A draft that has not been stored yet.
    pub fn draft(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            created_at: unix_epoch(),
            title: title.into(),
            published: None,
            pages: None,
            genres: Vec::new(),
            rating: None,
            version: 0,
        }
    }

    /// Check the field rules shared by create and update.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "must be provided"));
        }
        if self.pages.is_some_and(|pages| pages < 0) {
            errors.push(FieldError::new("pages", "must not be negative"));
        }
        if let Some(rating) = self.rating {
            if !(0.0..=MAX_RATING).contains(&rating) {
                errors.push(FieldError::new("rating", "must be between 0 and 5"));
            }
        }
        if self.genres.iter().any(|genre| genre.trim().is_empty()) {
            errors.push(FieldError::new("genres", "must not contain empty values"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Body of `POST /v1/books`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBook {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

impl CreateBook {
    pub fn into_draft(self) -> Book {
        Book {
            published: self.published,
            pages: self.pages,
            genres: self.genres.unwrap_or_default(),
            rating: self.rating,
            ..Book::draft(self.title)
        }
    }
}

/// Body of `PUT /v1/books/{id}`: every field is independently present or absent.
/// A JSON `null` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBook {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub published: Option<i32>,
    #[serde(default)]
    pub pages: Option<i32>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub rating: Option<f32>,
}

impl UpdateBook {
    /// Merge this update onto `book`, returning a new value. `book` is left untouched
    /// and the result keeps its id, timestamp and version.
    pub fn apply_to(&self, book: &Book, empty_genres: EmptyGenresPolicy) -> Book {
        let mut merged = book.clone();

        if let Some(title) = &self.title {
            merged.title = title.clone();
        }
        if let Some(published) = self.published {
            merged.published = Some(published);
        }
        if let Some(pages) = self.pages {
            merged.pages = Some(pages);
        }
        if let Some(rating) = self.rating {
            merged.rating = Some(rating);
        }
        match (&self.genres, empty_genres) {
            (Some(genres), _) if !genres.is_empty() => merged.genres = genres.clone(),
            (Some(_), EmptyGenresPolicy::Clear) => merged.genres.clear(),
            (Some(_), EmptyGenresPolicy::Ignore) | (None, _) => {}
        }

        merged
    }
}

/// One rejected field, reported in the `details` of a validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub error: &'static str,
}

impl FieldError {
    pub fn new(field: &'static str, error: &'static str) -> Self {
        Self { field, error }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({ "field": self.field, "error": self.error })
    }
}

fn unix_epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

fn is_unset(value: &Option<i32>) -> bool {
    matches!(value, None | Some(0))
}

fn is_unset_rating(value: &Option<f32>) -> bool {
    match value {
        None => true,
        Some(rating) => *rating == 0.0,
    }
}

/// `pages` is written as a JSON string and read back from either a string or a number.
mod pages_as_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(pages: &Option<i32>, serializer: S) -> Result<S::Ok, S::Error> {
        match pages {
            Some(pages) => serializer.collect_str(pages),
            None => serializer.serialize_none(),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i32),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Number(pages)) => Ok(Some(pages)),
            Some(Raw::Text(text)) => text
                .parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid page count \"{text}\""))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Book {
        Book {
            id: 7,
            title: "A".to_string(),
            published: Some(1999),
            pages: Some(100),
            genres: vec!["Fiction".to_string(), "Mystery".to_string()],
            rating: Some(4.5),
            version: 3,
            ..Book::draft("")
        }
    }

    #[test]
    fn serializes_wire_shape() {
        let value = serde_json::to_value(stored()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 7,
                "title": "A",
                "published": 1999,
                "pages": "100",
                "genres": ["Fiction", "Mystery"],
                "rating": 4.5
            })
        );
    }

    #[test]
    fn omits_unset_and_zero_fields() {
        let book = Book {
            id: 1,
            published: Some(0),
            pages: Some(0),
            rating: Some(0.0),
            ..Book::draft("Sparse")
        };
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value, json!({"id": 1, "title": "Sparse"}));
    }

    #[test]
    fn deserializes_pages_from_string_or_number() {
        let book: Book = serde_json::from_str(r#"{"id":1,"title":"T","pages":"320"}"#).unwrap();
        assert_eq!(book.pages, Some(320));

        let book: Book = serde_json::from_str(r#"{"id":1,"title":"T","pages":320}"#).unwrap();
        assert_eq!(book.pages, Some(320));

        assert!(serde_json::from_str::<Book>(r#"{"id":1,"title":"T","pages":"lots"}"#).is_err());
    }

    #[test]
    fn partial_update_only_touches_present_fields() {
        let book = stored();
        let update = UpdateBook {
            pages: Some(150),
            ..UpdateBook::default()
        };

        let merged = update.apply_to(&book, EmptyGenresPolicy::Ignore);
        assert_eq!(merged.pages, Some(150));
        assert_eq!(merged.title, "A");
        assert_eq!(merged.published, book.published);
        assert_eq!(merged.genres, book.genres);
        assert_eq!(merged.rating, book.rating);
        assert_eq!(merged.version, book.version);
        assert_eq!(merged.id, book.id);
    }

    #[test]
    fn merge_leaves_original_untouched() {
        let book = stored();
        let snapshot = book.clone();
        let update = UpdateBook {
            title: Some("B".to_string()),
            genres: Some(vec!["Poetry".to_string()]),
            ..UpdateBook::default()
        };

        let merged = update.apply_to(&book, EmptyGenresPolicy::Ignore);
        assert_eq!(book, snapshot);
        assert_eq!(merged.title, "B");
        assert_eq!(merged.genres, vec!["Poetry".to_string()]);
    }

    #[test]
    fn empty_genres_follow_policy() {
        let book = stored();
        let update = UpdateBook {
            genres: Some(Vec::new()),
            ..UpdateBook::default()
        };

        let ignored = update.apply_to(&book, EmptyGenresPolicy::Ignore);
        assert_eq!(ignored.genres, book.genres);

        let cleared = update.apply_to(&book, EmptyGenresPolicy::Clear);
        assert!(cleared.genres.is_empty());
    }

    #[test]
    fn absent_genres_kept_under_either_policy() {
        let book = stored();
        let update = UpdateBook::default();

        for policy in [EmptyGenresPolicy::Ignore, EmptyGenresPolicy::Clear] {
            assert_eq!(update.apply_to(&book, policy), book);
        }
    }

    #[test]
    fn update_shape_treats_null_as_absent() {
        let update: UpdateBook = serde_json::from_str(r#"{"title":null,"pages":150}"#).unwrap();
        assert_eq!(update.title, None);
        assert_eq!(update.pages, Some(150));
    }

    #[test]
    fn validation_reports_every_bad_field() {
        let book = Book {
            pages: Some(-1),
            rating: Some(5.5),
            genres: vec![" ".to_string()],
            ..Book::draft("  ")
        };

        let errors = book.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["title", "pages", "rating", "genres"]);
    }

    #[test]
    fn published_year_is_not_range_checked() {
        for year in [-500, 0, 2024] {
            let book = Book {
                published: Some(year),
                ..Book::draft("Old")
            };
            assert!(book.validate().is_ok(), "year {year} should be accepted");
        }
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        for rating in [0.0, 2.5, 5.0] {
            let book = Book {
                rating: Some(rating),
                ..Book::draft("Rated")
            };
            assert!(book.validate().is_ok(), "rating {rating} should be accepted");
        }

        let book = Book {
            rating: Some(f32::NAN),
            ..Book::draft("Rated")
        };
        assert!(book.validate().is_err());
    }

    #[test]
    fn create_body_becomes_draft() {
        let body: CreateBook =
            serde_json::from_str(r#"{"title":"Dune","pages":412,"genres":["SciFi"]}"#).unwrap();
        let draft = body.into_draft();
        assert_eq!(draft.id, 0);
        assert_eq!(draft.title, "Dune");
        assert_eq!(draft.pages, Some(412));
        assert_eq!(draft.genres, vec!["SciFi".to_string()]);
        assert_eq!(draft.rating, None);
    }
}
