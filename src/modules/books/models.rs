use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `GET /search?title=...`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub title: Option<String>,
}

/// Request body for `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Free-text title to look up on OpenLibrary
    pub title: String,
}

/// `?lang=...`, an ISO 639 code as stored (e.g. `en`, `spa`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageQuery {
    pub lang: Option<String>,
}

/// Number of stored books in one language.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LanguageCount {
    pub language: String,
    pub language_display: String,
    pub count: i64,
}
