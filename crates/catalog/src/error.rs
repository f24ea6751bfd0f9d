//! Error taxonomy for catalog operations.
//!
//! | Error | Retried | Typical HTTP status |
//! |-------|---------|---------------------|
//! | [`InvalidInput`](CatalogError::InvalidInput) | never | 422 |
//! | [`ResourceNotFound`](CatalogError::ResourceNotFound) | never | 404 |
//! | [`UniqueConstraintViolation`](CatalogError::UniqueConstraintViolation) | inside reconciliation | 409 |
//! | [`UpstreamUnavailable`](CatalogError::UpstreamUnavailable) | by the caller, with backoff | 503 |
//! | [`Storage`](CatalogError::Storage) | never | 500 |

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Kind of stored entity, used to report which unique key collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Author,
    Book,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Author => f.write_str("author"),
            Entity::Book => f.write_str("book"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    ResourceNotFound(String),

    #[error("{entity} with key '{key}' already exists")]
    UniqueConstraintViolation { entity: Entity, key: String },

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl CatalogError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::ResourceNotFound(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(message.into())
    }

    /// Translate an insert failure, turning unique index violations into
    /// [`CatalogError::UniqueConstraintViolation`].
    pub(crate) fn from_insert(err: sqlx::Error, entity: Entity, key: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::UniqueConstraintViolation {
                    entity,
                    key: key.to_string(),
                }
            }
            _ => Self::Storage(err),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueConstraintViolation { .. })
    }
}
