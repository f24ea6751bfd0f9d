//! SQLite-backed entity store for authors and books.
//!
//! Reads run directly on the pool through [`Store`]. Writes happen inside a
//! [`StoreTx`], which holds a `BEGIN IMMEDIATE` transaction until it is
//! committed; dropping it uncommitted rolls everything back.
//!
//! Unique indexes on `openlibrary_id` back the no-duplicates invariant:
//! saving an existing key fails with
//! [`CatalogError::UniqueConstraintViolation`].

use literalura_db::Database;
use sqlx::{FromRow, Sqlite, SqliteExecutor, Transaction};

use crate::error::{CatalogError, Entity, Result};
use crate::model::{Author, Book, BookWithAuthor, NewAuthor, NewBook};

const AUTHOR_COLUMNS: &str =
    "id, openlibrary_id AS open_library_id, name, birth_date, death_date, bio";

const BOOK_COLUMNS: &str = "id, openlibrary_id AS open_library_id, title, first_publish_year, \
     cover_id, language, search_count, author_id";

const BOOK_WITH_AUTHOR_SELECT: &str = "SELECT b.id, b.openlibrary_id AS open_library_id, b.title, \
     b.first_publish_year, b.cover_id, b.language, b.search_count, b.author_id, \
     a.openlibrary_id AS a_open_library_id, a.name AS a_name, a.birth_date AS a_birth_date, \
     a.death_date AS a_death_date, a.bio AS a_bio \
     FROM books b JOIN authors a ON a.id = b.author_id";

/// Flat row of a books/authors join.
#[derive(FromRow)]
struct BookAuthorRow {
    #[sqlx(flatten)]
    book: Book,
    a_open_library_id: String,
    a_name: String,
    a_birth_date: Option<time::Date>,
    a_death_date: Option<time::Date>,
    a_bio: Option<String>,
}

impl From<BookAuthorRow> for BookWithAuthor {
    fn from(row: BookAuthorRow) -> Self {
        let author = Author {
            id: row.book.author_id,
            open_library_id: row.a_open_library_id,
            name: row.a_name,
            birth_date: row.a_birth_date,
            death_date: row.a_death_date,
            bio: row.a_bio,
        };
        Self {
            book: row.book,
            author,
        }
    }
}

/// Read access to the catalog and the entry point for write transactions.
#[derive(Debug, Clone)]
pub struct Store {
    db: Database,
}

impl Store {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Start a write transaction.
    pub async fn begin(&self) -> Result<StoreTx> {
        let tx = self.db.begin_immediate().await?;
        Ok(StoreTx { tx })
    }

    pub async fn find_author_by_key(&self, key: &str) -> Result<Option<Author>> {
        Ok(author_by_key(self.db.pool(), key).await?)
    }

    pub async fn find_author_by_name(&self, name: &str) -> Result<Option<Author>> {
        Ok(author_by_name(self.db.pool(), name).await?)
    }

    pub async fn author_exists(&self, key: &str) -> Result<bool> {
        Ok(exists(self.db.pool(), "authors", key).await?)
    }

    pub async fn all_authors(&self) -> Result<Vec<Author>> {
        let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY id");
        Ok(sqlx::query_as(&sql).fetch_all(self.db.pool()).await?)
    }

    /// Authors whose known birth/death years bracket `year`, inclusive.
    pub async fn authors_alive_in(&self, year: i32) -> Result<Vec<Author>> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors \
             WHERE (birth_date IS NULL OR CAST(strftime('%Y', birth_date) AS INTEGER) <= ?) \
               AND (death_date IS NULL OR CAST(strftime('%Y', death_date) AS INTEGER) >= ?) \
             ORDER BY id"
        );
        Ok(sqlx::query_as(&sql)
            .bind(year)
            .bind(year)
            .fetch_all(self.db.pool())
            .await?)
    }

    pub async fn find_book_by_key(&self, key: &str) -> Result<Option<Book>> {
        Ok(book_by_key(self.db.pool(), key).await?)
    }

    pub async fn book_exists(&self, key: &str) -> Result<bool> {
        Ok(exists(self.db.pool(), "books", key).await?)
    }

    pub async fn all_books(&self) -> Result<Vec<BookWithAuthor>> {
        let sql = format!("{BOOK_WITH_AUTHOR_SELECT} ORDER BY b.id");
        self.books_with_authors(&sql, None).await
    }

    /// Books in `language`, compared case-insensitively.
    pub async fn books_by_language(&self, language: &str) -> Result<Vec<BookWithAuthor>> {
        let sql =
            format!("{BOOK_WITH_AUTHOR_SELECT} WHERE b.language = ? COLLATE NOCASE ORDER BY b.id");
        self.books_with_authors(&sql, Some(language)).await
    }

    /// Every book, most searched first; ties keep insertion order.
    pub async fn books_by_popularity(&self) -> Result<Vec<BookWithAuthor>> {
        let sql = format!("{BOOK_WITH_AUTHOR_SELECT} ORDER BY b.search_count DESC, b.id ASC");
        self.books_with_authors(&sql, None).await
    }

    /// Books owned by one author.
    pub async fn books_by_author(&self, author_id: i64) -> Result<Vec<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE author_id = ? ORDER BY id");
        Ok(sqlx::query_as(&sql)
            .bind(author_id)
            .fetch_all(self.db.pool())
            .await?)
    }

    pub async fn count_by_language(&self, language: &str) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM books WHERE language = ? COLLATE NOCASE")
                .bind(language)
                .fetch_one(self.db.pool())
                .await?;
        Ok(count)
    }

    async fn books_with_authors(
        &self,
        sql: &str,
        language: Option<&str>,
    ) -> Result<Vec<BookWithAuthor>> {
        let mut query = sqlx::query_as::<_, BookAuthorRow>(sql);
        if let Some(language) = language {
            query = query.bind(language);
        }
        let rows = query.fetch_all(self.db.pool()).await?;
        Ok(rows.into_iter().map(BookWithAuthor::from).collect())
    }
}

/// An open write transaction on the catalog.
pub struct StoreTx {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTx {
    pub async fn find_author_by_key(&mut self, key: &str) -> Result<Option<Author>> {
        Ok(author_by_key(&mut *self.tx, key).await?)
    }

    pub async fn find_author_by_name(&mut self, name: &str) -> Result<Option<Author>> {
        Ok(author_by_name(&mut *self.tx, name).await?)
    }

    pub async fn find_book_by_key(&mut self, key: &str) -> Result<Option<Book>> {
        Ok(book_by_key(&mut *self.tx, key).await?)
    }

    pub async fn book_exists(&mut self, key: &str) -> Result<bool> {
        Ok(exists(&mut *self.tx, "books", key).await?)
    }

    /// Insert an author and return it with its assigned id.
    pub async fn save_author(&mut self, author: NewAuthor) -> Result<Author> {
        let sql = format!(
            "INSERT INTO authors (openlibrary_id, name, birth_date, death_date, bio) \
             VALUES (?, ?, ?, ?, ?) RETURNING {AUTHOR_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(&author.open_library_id)
            .bind(&author.name)
            .bind(author.birth_date)
            .bind(author.death_date)
            .bind(&author.bio)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| CatalogError::from_insert(e, Entity::Author, &author.open_library_id))
    }

    /// Insert a book with a popularity counter of 1.
    pub async fn save_book(&mut self, book: NewBook) -> Result<Book> {
        let sql = format!(
            "INSERT INTO books (openlibrary_id, title, first_publish_year, cover_id, language, \
             search_count, author_id) VALUES (?, ?, ?, ?, ?, 1, ?) RETURNING {BOOK_COLUMNS}"
        );
        sqlx::query_as(&sql)
            .bind(&book.open_library_id)
            .bind(&book.title)
            .bind(book.first_publish_year)
            .bind(book.cover_id)
            .bind(&book.language)
            .bind(book.author_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| CatalogError::from_insert(e, Entity::Book, &book.open_library_id))
    }

    /// Add one to a book's counter in a single statement and return the new value.
    pub async fn increment_popularity(&mut self, book_id: i64) -> Result<i64> {
        let row: Option<(i64,)> = sqlx::query_as(
            "UPDATE books SET search_count = search_count + 1 WHERE id = ? RETURNING search_count",
        )
        .bind(book_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|(count,)| count)
            .ok_or_else(|| CatalogError::not_found(format!("book {book_id} does not exist")))
    }

    pub async fn commit(self) -> Result<()> {
        Ok(self.tx.commit().await?)
    }

    pub async fn rollback(self) -> Result<()> {
        Ok(self.tx.rollback().await?)
    }
}

async fn author_by_key<'e>(
    exec: impl SqliteExecutor<'e>,
    key: &str,
) -> sqlx::Result<Option<Author>> {
    let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE openlibrary_id = ?");
    sqlx::query_as(&sql).bind(key).fetch_optional(exec).await
}

async fn author_by_name<'e>(
    exec: impl SqliteExecutor<'e>,
    name: &str,
) -> sqlx::Result<Option<Author>> {
    let sql = format!(
        "SELECT {AUTHOR_COLUMNS} FROM authors WHERE name = ? COLLATE NOCASE ORDER BY id LIMIT 1"
    );
    sqlx::query_as(&sql).bind(name).fetch_optional(exec).await
}

async fn book_by_key<'e>(exec: impl SqliteExecutor<'e>, key: &str) -> sqlx::Result<Option<Book>> {
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE openlibrary_id = ?");
    sqlx::query_as(&sql).bind(key).fetch_optional(exec).await
}

async fn exists<'e>(exec: impl SqliteExecutor<'e>, table: &str, key: &str) -> sqlx::Result<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE openlibrary_id = ?)");
    let (found,): (bool,) = sqlx::query_as(&sql).bind(key).fetch_one(exec).await?;
    Ok(found)
}
