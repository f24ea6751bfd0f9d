//! LiterAlura catalog core.
//!
//! Turns OpenLibrary search hits into a deduplicated local catalog of
//! authors and books:
//!
//! - [`identity`] derives deterministic keys from normalized text
//! - [`store`] persists entities in SQLite with unique external keys
//! - [`reconcile`] maps a search hit onto existing-or-new rows atomically
//! - [`cache`] memoizes the read queries
//! - [`service`] is the facade used by the HTTP modules and the CLI

pub mod cache;
pub mod error;
pub mod identity;
pub mod model;
pub mod openlibrary;
pub mod reconcile;
pub mod schema;
pub mod service;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{CatalogError, Entity, Result};
pub use identity::IdGenerator;
pub use model::{Author, AuthorView, Book, BookView, BookWithAuthor};
pub use openlibrary::{BookSearch, OpenLibraryClient};
pub use service::CatalogService;
pub use store::Store;
