//! Fixtures shared by unit tests here and by downstream crates' tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use literalura_db::Database;
use literalura_kernel::settings::DatabaseSettings;
use tempfile::TempDir;

use crate::error::{CatalogError, Result};
use crate::openlibrary::{BookSearch, SearchDoc, SearchResult};
use crate::schema;
use crate::store::Store;

/// Fresh in-memory catalog with the schema applied.
pub async fn memory_store() -> Store {
    let db = Database::connect_in_memory()
        .await
        .expect("failed to open in-memory database");
    db.migrate(&schema::migrations())
        .await
        .expect("failed to migrate in-memory database");
    Store::new(db)
}

/// File-backed catalog with a multi-connection pool, for concurrency tests.
///
/// Keep the `TempDir` alive for as long as the store is used.
pub async fn file_store() -> (Store, TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let settings = DatabaseSettings {
        url: format!("sqlite:{}", dir.path().join("catalog.db").display()),
        max_connections: 8,
        busy_timeout_ms: 10_000,
    };
    let db = Database::connect(&settings)
        .await
        .expect("failed to open test database");
    db.migrate(&schema::migrations())
        .await
        .expect("failed to migrate test database");
    (Store::new(db), dir)
}

/// The Dune search hit used across tests.
pub fn dune() -> SearchDoc {
    SearchDoc {
        title: Some("Dune".to_string()),
        author_name: vec!["Frank Herbert".to_string()],
        author_key: vec!["OL79034A".to_string()],
        first_publish_year: Some(1965),
        cover_id: Some(11481354),
        language: vec!["en".to_string()],
    }
}

enum Reply {
    Docs(Vec<SearchDoc>),
    Unavailable,
}

/// Canned [`BookSearch`] that records how often it was called.
pub struct StubSearch {
    reply: Reply,
    calls: AtomicUsize,
}

impl StubSearch {
    pub fn returning(doc: SearchDoc) -> Self {
        Self::with_reply(Reply::Docs(vec![doc]))
    }

    pub fn empty() -> Self {
        Self::with_reply(Reply::Docs(vec![]))
    }

    /// Fails every call as if the upstream timed out.
    pub fn unavailable() -> Self {
        Self::with_reply(Reply::Unavailable)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn with_reply(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BookSearch for StubSearch {
    async fn search_by_title(&self, _title: &str, limit: u32) -> Result<SearchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Docs(docs) => Ok(SearchResult {
                num_found: Some(docs.len() as u64),
                start: Some(0),
                docs: docs.iter().take(limit as usize).cloned().collect(),
            }),
            Reply::Unavailable => Err(CatalogError::upstream("stubbed timeout")),
        }
    }
}
