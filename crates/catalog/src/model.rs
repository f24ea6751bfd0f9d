//! Stored catalog entities and the views returned to callers.

use serde::Serialize;
use time::Date;
use utoipa::ToSchema;

/// Name stored for authors the upstream source says nothing about.
pub const UNKNOWN_AUTHOR_NAME: &str = "Autor Desconocido";

/// Language stored for books the upstream source gives no language for.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// A stored author. Books reference their author through `author_id`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    /// Upstream author key, or a content-derived `AUTHOR_` key.
    pub open_library_id: String,
    pub name: String,
    pub birth_date: Option<Date>,
    pub death_date: Option<Date>,
    pub bio: Option<String>,
}

impl Author {
    /// Whether the author was alive at some point during `year`.
    ///
    /// Unknown birth or death dates never exclude the author.
    pub fn is_alive_in(&self, year: i32) -> bool {
        let born = self.birth_date.map_or(true, |d| d.year() <= year);
        let not_dead = self.death_date.map_or(true, |d| d.year() >= year);
        born && not_dead
    }
}

/// Author fields known before the first save.
#[derive(Debug, Clone, Default)]
pub struct NewAuthor {
    pub open_library_id: String,
    pub name: String,
    pub birth_date: Option<Date>,
    pub death_date: Option<Date>,
    pub bio: Option<String>,
}

/// A stored book.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Book {
    pub id: i64,
    /// Content-derived `BOOK_` key.
    pub open_library_id: String,
    pub title: String,
    pub first_publish_year: Option<i32>,
    pub cover_id: Option<i64>,
    pub language: String,
    /// How many searches resolved to this book.
    pub search_count: i64,
    pub author_id: i64,
}

/// Book fields known before the first save. The counter starts at 1.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub open_library_id: String,
    pub title: String,
    pub first_publish_year: Option<i32>,
    pub cover_id: Option<i64>,
    pub language: String,
    pub author_id: i64,
}

/// A book together with the author that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookWithAuthor {
    pub book: Book,
    pub author: Author,
}

/// Display name for a language code.
pub fn language_display(code: &str) -> String {
    match code.to_lowercase().as_str() {
        "es" | "spa" => "Español".to_string(),
        "en" | "eng" => "Inglés".to_string(),
        "fr" | "fre" => "Francés".to_string(),
        "de" | "ger" => "Alemán".to_string(),
        "it" | "ita" => "Italiano".to_string(),
        "pt" | "por" => "Portugués".to_string(),
        "" | UNKNOWN_LANGUAGE => "Desconocido".to_string(),
        _ => code.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthorView {
    pub id: i64,
    pub name: String,
    pub birth_date: Option<Date>,
    pub death_date: Option<Date>,
    pub bio: Option<String>,
}

impl From<&Author> for AuthorView {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            name: author.name.clone(),
            birth_date: author.birth_date,
            death_date: author.death_date,
            bio: author.bio.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BookView {
    pub id: i64,
    pub title: String,
    pub first_publish_year: Option<i32>,
    pub cover_id: Option<i64>,
    pub language: String,
    pub language_display: String,
    pub search_count: i64,
    pub author: AuthorView,
}

impl From<&BookWithAuthor> for BookView {
    fn from(entry: &BookWithAuthor) -> Self {
        let book = &entry.book;
        Self {
            id: book.id,
            title: book.title.clone(),
            first_publish_year: book.first_publish_year,
            cover_id: book.cover_id,
            language: book.language.clone(),
            language_display: language_display(&book.language),
            search_count: book.search_count,
            author: AuthorView::from(&entry.author),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::Month;

    fn author(birth: Option<Date>, death: Option<Date>) -> Author {
        Author {
            id: 1,
            open_library_id: "OL1A".to_string(),
            name: "Someone".to_string(),
            birth_date: birth,
            death_date: death,
            bio: None,
        }
    }

    #[test]
    fn alive_in_year_includes_both_boundary_years() {
        let a = author(Some(date!(1800 - 06 - 01)), Some(date!(1850 - 02 - 10)));
        assert!(a.is_alive_in(1800));
        assert!(a.is_alive_in(1825));
        assert!(a.is_alive_in(1850));
        assert!(!a.is_alive_in(1851));
        assert!(!a.is_alive_in(1799));
    }

    #[test]
    fn unknown_birth_is_alive_from_year_one() {
        assert!(author(None, None).is_alive_in(1));
        let year_one = Date::from_calendar_date(1, Month::December, 31).unwrap();
        let year_zero = Date::from_calendar_date(0, Month::December, 31).unwrap();
        assert!(author(None, Some(year_one)).is_alive_in(1));
        assert!(!author(None, Some(year_zero)).is_alive_in(1));
    }

    #[test]
    fn unknown_death_is_alive_forever_after_birth() {
        let a = author(Some(date!(1920 - 01 - 01)), None);
        assert!(a.is_alive_in(2500));
        assert!(!a.is_alive_in(1919));
    }

    #[test]
    fn language_display_names() {
        assert_eq!(language_display("en"), "Inglés");
        assert_eq!(language_display("ES"), "Español");
        assert_eq!(language_display("unknown"), "Desconocido");
        assert_eq!(language_display("jpn"), "jpn");
    }

    #[test]
    fn book_view_serializes_author_and_display_language() {
        let entry = BookWithAuthor {
            book: Book {
                id: 7,
                open_library_id: "BOOK_ABC".to_string(),
                title: "Dune".to_string(),
                first_publish_year: Some(1965),
                cover_id: None,
                language: "eng".to_string(),
                search_count: 3,
                author_id: 1,
            },
            author: author(Some(date!(1920 - 10 - 08)), None),
        };

        let json = serde_json::to_value(BookView::from(&entry)).unwrap();
        assert_eq!(json["language_display"], "Inglés");
        assert_eq!(json["search_count"], 3);
        assert_eq!(json["author"]["birth_date"], "1920-10-08");
        assert!(json.get("open_library_id").is_none());
    }
}
