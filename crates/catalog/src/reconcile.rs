//! Maps one upstream search hit onto existing-or-new author and book rows.
//!
//! The author lookup/creation and the book creation/increment for a document
//! commit together in one transaction or not at all. Two callers racing to
//! create the same row are serialized by the store's write lock; should one
//! still lose on the unique index, its transaction is rolled back and the
//! document is reconciled again, this time as lookup-and-increment.

use std::future::Future;
use std::sync::Arc;

use tracing::instrument;

use crate::error::{CatalogError, Result};
use crate::identity::IdGenerator;
use crate::model::{
    Author, Book, BookWithAuthor, NewAuthor, NewBook, UNKNOWN_AUTHOR_NAME, UNKNOWN_LANGUAGE,
};
use crate::openlibrary::{BookSearch, SearchDoc};
use crate::store::{Store, StoreTx};

/// Attempts per document before a unique-key conflict is reported.
///
/// Writers hold the database write lock for the whole attempt, so a conflict
/// needs a writer outside this process. If every attempt still collides, the
/// last [`CatalogError::UniqueConstraintViolation`] is returned to the caller
/// rather than retrying forever.
pub const MAX_RECONCILE_ATTEMPTS: u32 = 3;

/// Only the top-ranked upstream hit is reconciled.
const SEARCH_LIMIT: u32 = 1;

pub struct Reconciler<S> {
    store: Store,
    search: Arc<S>,
    ids: IdGenerator,
}

impl<S: BookSearch> Reconciler<S> {
    pub fn new(store: Store, search: Arc<S>, ids: IdGenerator) -> Self {
        Self { store, search, ids }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Search upstream by title and reconcile the first hit.
    ///
    /// Nothing is written when the upstream call fails or returns no documents.
    #[instrument(skip(self))]
    pub async fn search_and_store(&self, title: &str) -> Result<BookWithAuthor> {
        let title = title.trim();
        if title.is_empty() {
            return Err(CatalogError::invalid_input("title must not be blank"));
        }

        let result = self.search.search_by_title(title, SEARCH_LIMIT).await?;
        let doc = result.docs.into_iter().next().ok_or_else(|| {
            CatalogError::not_found(format!("no OpenLibrary results for title '{title}'"))
        })?;

        self.reconcile(&doc).await
    }

    /// Reconcile one document, retrying when a concurrent writer created the
    /// same author or book first.
    pub async fn reconcile(&self, doc: &SearchDoc) -> Result<BookWithAuthor> {
        let title = doc
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CatalogError::invalid_input("search result has no title"))?;

        retry_on_conflict(title, move |_| self.reconcile_once(title, doc)).await
    }

    async fn reconcile_once(&self, title: &str, doc: &SearchDoc) -> Result<BookWithAuthor> {
        // Dropping `tx` on any early return rolls the whole attempt back.
        let mut tx = self.store.begin().await?;
        let author = self.resolve_author(&mut tx, doc).await?;
        let book = self.resolve_book(&mut tx, title, doc, &author).await?;
        tx.commit().await?;

        Ok(BookWithAuthor { book, author })
    }

    /// Key match first; name match only when the document has no key.
    async fn resolve_author(&self, tx: &mut StoreTx, doc: &SearchDoc) -> Result<Author> {
        let name = doc.first_author_name().unwrap_or(UNKNOWN_AUTHOR_NAME);

        if let Some(key) = doc.first_author_key() {
            if let Some(author) = tx.find_author_by_key(key).await? {
                return Ok(author);
            }
            return self.create_author(tx, key.to_string(), name).await;
        }

        if let Some(author) = tx.find_author_by_name(name).await? {
            return Ok(author);
        }

        // Names differing only in case or punctuation share a generated key.
        let key = self.ids.author_id(name)?;
        if let Some(author) = tx.find_author_by_key(&key).await? {
            return Ok(author);
        }
        self.create_author(tx, key, name).await
    }

    async fn create_author(&self, tx: &mut StoreTx, key: String, name: &str) -> Result<Author> {
        let author = tx
            .save_author(NewAuthor {
                open_library_id: key,
                name: name.to_string(),
                ..NewAuthor::default()
            })
            .await?;
        tracing::info!(author_key = %author.open_library_id, name = %author.name, "created author");
        Ok(author)
    }

    async fn resolve_book(
        &self,
        tx: &mut StoreTx,
        title: &str,
        doc: &SearchDoc,
        author: &Author,
    ) -> Result<Book> {
        let key = self.ids.book_id(title, Some(&author.open_library_id))?;

        if let Some(mut book) = tx.find_book_by_key(&key).await? {
            book.search_count = tx.increment_popularity(book.id).await?;
            tracing::info!(
                book_key = %key,
                title = %book.title,
                search_count = book.search_count,
                "incremented popularity of existing book"
            );
            return Ok(book);
        }

        let book = tx
            .save_book(NewBook {
                open_library_id: key,
                title: title.to_string(),
                first_publish_year: doc.first_publish_year,
                cover_id: doc.cover_id,
                language: doc.first_language().unwrap_or(UNKNOWN_LANGUAGE).to_string(),
                author_id: author.id,
            })
            .await?;
        tracing::info!(book_key = %book.open_library_id, title = %book.title, "created book");
        Ok(book)
    }
}

/// Run `attempt` until it succeeds, fails with anything other than a unique
/// conflict, or has been tried [`MAX_RECONCILE_ATTEMPTS`] times. Attempts are
/// numbered from 1.
async fn retry_on_conflict<T, F, Fut>(title: &str, mut attempt: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut number = 1;
    loop {
        match attempt(number).await {
            Err(err) if err.is_unique_violation() && number < MAX_RECONCILE_ATTEMPTS => {
                tracing::warn!(
                    title,
                    attempt = number,
                    error = %err,
                    "lost creation race; retrying as lookup"
                );
                number += 1;
            }
            outcome => return outcome,
        }
    }
}
