//! Memoized read views over the store.
//!
//! Each view is filled lazily the first time a key is read and then served
//! from memory until [`ReadCache::invalidate_all`] is called. Writes made by
//! reconciliation do not invalidate anything, so views may be stale until
//! then.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::Result;
use crate::model::{AuthorView, BookView};
use crate::store::Store;

/// Size of the most-searched list.
pub const TOP_BOOKS_LIMIT: usize = 5;

/// One keyed memo table.
///
/// Two readers missing the same key at once both load it; the first value
/// stored is the one every later reader sees.
pub struct View<K, V> {
    name: &'static str,
    entries: DashMap<K, Arc<V>>,
}

impl<K, V> View<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: DashMap::new(),
        }
    }

    pub async fn get_or_load<F, Fut>(&self, key: K, load: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(hit) = self.entries.get(&key) {
            tracing::trace!(view = self.name, ?key, "cache hit");
            return Ok(hit.value().clone());
        }

        tracing::debug!(view = self.name, ?key, "cache miss; loading");
        let loaded = Arc::new(load().await?);
        Ok(self.entries.entry(key).or_insert(loaded).value().clone())
    }

    pub fn invalidate(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The cached catalog queries.
pub struct ReadCache {
    all_books: View<(), Vec<BookView>>,
    /// Keyed by the language exactly as requested; "en" and "EN" are separate entries.
    books_by_language: View<String, Vec<BookView>>,
    top_books: View<(), Vec<BookView>>,
    all_authors: View<(), Vec<AuthorView>>,
    authors_alive: View<i32, Vec<AuthorView>>,
}

impl ReadCache {
    pub fn new() -> Self {
        Self {
            all_books: View::new("books"),
            books_by_language: View::new("books_by_language"),
            top_books: View::new("top_books"),
            all_authors: View::new("authors"),
            authors_alive: View::new("authors_alive"),
        }
    }

    pub async fn all_books(&self, store: &Store) -> Result<Arc<Vec<BookView>>> {
        self.all_books
            .get_or_load((), || async move {
                let books = store.all_books().await?;
                Ok(books.iter().map(BookView::from).collect())
            })
            .await
    }

    pub async fn books_by_language(
        &self,
        store: &Store,
        language: &str,
    ) -> Result<Arc<Vec<BookView>>> {
        self.books_by_language
            .get_or_load(language.to_string(), || async move {
                let books = store.books_by_language(language).await?;
                Ok(books.iter().map(BookView::from).collect())
            })
            .await
    }

    pub async fn top_books(&self, store: &Store) -> Result<Arc<Vec<BookView>>> {
        self.top_books
            .get_or_load((), || async move {
                let books = store.books_by_popularity().await?;
                Ok(books
                    .iter()
                    .take(TOP_BOOKS_LIMIT)
                    .map(BookView::from)
                    .collect())
            })
            .await
    }

    pub async fn all_authors(&self, store: &Store) -> Result<Arc<Vec<AuthorView>>> {
        self.all_authors
            .get_or_load((), || async move {
                let authors = store.all_authors().await?;
                Ok(authors.iter().map(AuthorView::from).collect())
            })
            .await
    }

    pub async fn authors_alive_in(&self, store: &Store, year: i32) -> Result<Arc<Vec<AuthorView>>> {
        self.authors_alive
            .get_or_load(year, || async move {
                let authors = store.authors_alive_in(year).await?;
                Ok(authors.iter().map(AuthorView::from).collect())
            })
            .await
    }

    /// Drop every cached entry in every view.
    pub fn invalidate_all(&self) {
        self.all_books.invalidate();
        self.books_by_language.invalidate();
        self.top_books.invalidate();
        self.all_authors.invalidate();
        self.authors_alive.invalidate();
        tracing::info!("read cache invalidated");
    }
}

impl Default for ReadCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use crate::model::{NewAuthor, NewBook};
    use crate::testing::memory_store;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn seed(store: &Store, books: &[(&str, &str)]) {
        let mut tx = store.begin().await.unwrap();
        let author = match tx.find_author_by_key("OL1A").await.unwrap() {
            Some(author) => author,
            None => tx
                .save_author(NewAuthor {
                    open_library_id: "OL1A".to_string(),
                    name: "Frank Herbert".to_string(),
                    ..NewAuthor::default()
                })
                .await
                .unwrap(),
        };
        for (title, language) in books {
            tx.save_book(NewBook {
                open_library_id: format!("BOOK_{title}"),
                title: title.to_string(),
                first_publish_year: None,
                cover_id: None,
                language: language.to_string(),
                author_id: author.id,
            })
            .await
            .unwrap();
        }
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn view_loads_once_per_key() {
        let view: View<i32, i32> = View::new("test");
        let counter = AtomicUsize::new(0);
        let loads = &counter;

        for _ in 0..3 {
            let value = view
                .get_or_load(7, || async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(49)
                })
                .await
                .unwrap();
            assert_eq!(*value, 49);
        }
        view.get_or_load(8, || async { Ok(64) }).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(view.len(), 2);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let view: View<(), i32> = View::new("test");

        let err = view
            .get_or_load((), || async { Err(CatalogError::invalid_input("boom")) })
            .await;
        assert!(err.is_err());
        assert!(view.is_empty());

        assert_eq!(*view.get_or_load((), || async { Ok(1) }).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn views_stay_stale_until_invalidated() {
        let store = memory_store().await;
        let cache = ReadCache::new();
        seed(&store, &[("Dune", "en")]).await;

        assert_eq!(cache.all_books(&store).await.unwrap().len(), 1);

        seed(&store, &[("Dune Messiah", "en")]).await;
        assert_eq!(cache.all_books(&store).await.unwrap().len(), 1);

        cache.invalidate_all();
        assert_eq!(cache.all_books(&store).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn language_keys_are_case_sensitive() {
        let store = memory_store().await;
        let cache = ReadCache::new();
        seed(&store, &[("Dune", "en")]).await;

        assert_eq!(cache.books_by_language(&store, "en").await.unwrap().len(), 1);
        seed(&store, &[("Dune Messiah", "en")]).await;

        // Same lookup, different key: loaded fresh from the store.
        assert_eq!(cache.books_by_language(&store, "EN").await.unwrap().len(), 2);
        assert_eq!(cache.books_by_language(&store, "en").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn top_books_are_capped_at_five() {
        let store = memory_store().await;
        let cache = ReadCache::new();
        seed(
            &store,
            &[("A", "en"), ("B", "en"), ("C", "en"), ("D", "en"), ("E", "en"), ("F", "en")],
        )
        .await;

        let top = cache.top_books(&store).await.unwrap();
        assert_eq!(top.len(), TOP_BOOKS_LIMIT);
        assert_eq!(top[0].title, "A");
    }

    #[tokio::test]
    async fn authors_views_are_keyed_by_year() {
        let store = memory_store().await;
        let cache = ReadCache::new();
        seed(&store, &[("Dune", "en")]).await;

        assert_eq!(cache.all_authors(&store).await.unwrap().len(), 1);
        assert_eq!(cache.authors_alive_in(&store, 1965).await.unwrap().len(), 1);
        assert_eq!(cache.authors_alive.len(), 1);
        cache.authors_alive_in(&store, 1966).await.unwrap();
        assert_eq!(cache.authors_alive.len(), 2);
    }
}
