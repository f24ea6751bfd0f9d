//! OpenLibrary search API.
//!
//! Reconciliation only depends on the [`BookSearch`] trait, so tests and
//! other callers can substitute their own source.

mod client;
pub mod dto;

use async_trait::async_trait;

pub use client::OpenLibraryClient;
pub use dto::{SearchDoc, SearchResult};

use crate::error::Result;

/// Free-text title search against a bibliographic source.
#[async_trait]
pub trait BookSearch: Send + Sync {
    /// Search by title, returning at most `limit` ranked documents.
    ///
    /// Network failures and timeouts surface as
    /// [`CatalogError::UpstreamUnavailable`](crate::error::CatalogError::UpstreamUnavailable).
    async fn search_by_title(&self, title: &str, limit: u32) -> Result<SearchResult>;
}

#[async_trait]
impl BookSearch for OpenLibraryClient {
    async fn search_by_title(&self, title: &str, limit: u32) -> Result<SearchResult> {
        self.search(title, limit).await
    }
}
