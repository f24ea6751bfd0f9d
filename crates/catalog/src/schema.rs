//! Table definitions, contributed as migrations by the `authors` and `books` modules.

use literalura_kernel::Migration;

pub const AUTHORS_INIT: Migration = Migration {
    id: "001_init",
    up: r#"
        CREATE TABLE IF NOT EXISTS authors (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            openlibrary_id TEXT    NOT NULL,
            name           TEXT    NOT NULL CHECK (name <> ''),
            birth_date     TEXT,
            death_date     TEXT,
            bio            TEXT
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_author_openlibrary_id ON authors (openlibrary_id);
        CREATE INDEX IF NOT EXISTS idx_author_name  ON authors (name COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_author_dates ON authors (birth_date, death_date);
    "#,
};

pub const BOOKS_INIT: Migration = Migration {
    id: "001_init",
    up: r#"
        CREATE TABLE IF NOT EXISTS books (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            openlibrary_id     TEXT    NOT NULL,
            title              TEXT    NOT NULL CHECK (title <> ''),
            first_publish_year INTEGER,
            cover_id           INTEGER,
            language           TEXT    NOT NULL DEFAULT 'unknown',
            search_count       INTEGER NOT NULL DEFAULT 1,
            author_id          INTEGER NOT NULL REFERENCES authors (id) ON DELETE CASCADE
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_book_openlibrary_id ON books (openlibrary_id);
        CREATE INDEX IF NOT EXISTS idx_book_title        ON books (title);
        CREATE INDEX IF NOT EXISTS idx_book_language     ON books (language COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_book_search_count ON books (search_count);
        CREATE INDEX IF NOT EXISTS idx_book_author       ON books (author_id);
    "#,
};

/// Every catalog migration, keyed by owning module, in application order.
pub fn migrations() -> Vec<(String, Migration)> {
    vec![
        ("authors".to_string(), AUTHORS_INIT),
        ("books".to_string(), BOOKS_INIT),
    ]
}
