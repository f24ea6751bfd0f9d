//! Catalog facade shared by the HTTP modules and the CLI.

use std::sync::Arc;

use crate::cache::ReadCache;
use crate::error::{CatalogError, Result};
use crate::identity::IdGenerator;
use crate::model::{AuthorView, BookView};
use crate::openlibrary::BookSearch;
use crate::reconcile::Reconciler;
use crate::store::Store;

pub struct CatalogService<S> {
    reconciler: Reconciler<S>,
    cache: ReadCache,
}

impl<S: BookSearch> CatalogService<S> {
    pub fn new(store: Store, search: Arc<S>, ids: IdGenerator) -> Self {
        Self {
            reconciler: Reconciler::new(store, search, ids),
            cache: ReadCache::new(),
        }
    }

    pub fn store(&self) -> &Store {
        self.reconciler.store()
    }

    /// Search upstream and record the first hit. The read cache is left as is.
    pub async fn search(&self, title: &str) -> Result<BookView> {
        let stored = self.reconciler.search_and_store(title).await?;
        Ok(BookView::from(&stored))
    }

    pub async fn all_books(&self) -> Result<Arc<Vec<BookView>>> {
        self.cache.all_books(self.store()).await
    }

    pub async fn books_by_language(&self, language: &str) -> Result<Arc<Vec<BookView>>> {
        let language = required_language(language)?;
        self.cache.books_by_language(self.store(), language).await
    }

    pub async fn top_books(&self) -> Result<Arc<Vec<BookView>>> {
        self.cache.top_books(self.store()).await
    }

    pub async fn all_authors(&self) -> Result<Arc<Vec<AuthorView>>> {
        self.cache.all_authors(self.store()).await
    }

    pub async fn authors_alive_in(&self, year: i32) -> Result<Arc<Vec<AuthorView>>> {
        if year < 1 {
            return Err(CatalogError::invalid_input(format!(
                "year must be a positive integer, got {year}"
            )));
        }
        self.cache.authors_alive_in(self.store(), year).await
    }

    /// Uncached.
    pub async fn count_by_language(&self, language: &str) -> Result<i64> {
        let language = required_language(language)?;
        self.store().count_by_language(language).await
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

fn required_language(language: &str) -> Result<&str> {
    let language = language.trim();
    if language.is_empty() {
        return Err(CatalogError::invalid_input("language must not be blank"));
    }
    Ok(language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dune, memory_store, StubSearch};

    async fn service(search: StubSearch) -> CatalogService<StubSearch> {
        CatalogService::new(memory_store().await, Arc::new(search), IdGenerator::default())
    }

    #[tokio::test]
    async fn dune_end_to_end() {
        let service = service(StubSearch::returning(dune())).await;

        let first = service.search("Dune").await.unwrap();
        assert_eq!(first.title, "Dune");
        assert_eq!(first.author.name, "Frank Herbert");
        assert_eq!(first.language_display, "Inglés");
        assert_eq!(first.search_count, 1);

        let second = service.search("Dune").await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.search_count, 2);

        assert_eq!(service.all_books().await.unwrap().len(), 1);
        assert_eq!(service.all_authors().await.unwrap().len(), 1);
        assert_eq!(service.count_by_language("en").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reads_are_stale_until_cache_is_invalidated() {
        let service = service(StubSearch::returning(dune())).await;
        service.search("Dune").await.unwrap();

        let top = service.top_books().await.unwrap();
        assert_eq!(top[0].search_count, 1);

        service.search("Dune").await.unwrap();
        assert_eq!(service.top_books().await.unwrap()[0].search_count, 1);
        // Counting bypasses the cache.
        assert_eq!(service.count_by_language("EN").await.unwrap(), 1);

        service.invalidate_cache();
        assert_eq!(service.top_books().await.unwrap()[0].search_count, 2);
    }

    #[tokio::test]
    async fn invalid_arguments_are_rejected() {
        let service = service(StubSearch::empty()).await;

        for year in [0, -5] {
            let err = service.authors_alive_in(year).await.unwrap_err();
            assert!(matches!(err, CatalogError::InvalidInput(_)));
        }
        assert!(matches!(
            service.books_by_language("  ").await.unwrap_err(),
            CatalogError::InvalidInput(_)
        ));
        assert!(matches!(
            service.count_by_language("").await.unwrap_err(),
            CatalogError::InvalidInput(_)
        ));
        assert!(service.authors_alive_in(1).await.unwrap().is_empty());
    }
}
