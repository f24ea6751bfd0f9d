//! Response shapes of `GET /search.json`.
//!
//! Every field is optional upstream; list fields default to empty.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResult {
    #[serde(rename = "numFound", alias = "num_found", default)]
    pub num_found: Option<u64>,
    #[serde(default)]
    pub start: Option<u64>,
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}

/// One ranked search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchDoc {
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Vec<String>,
    /// Upstream author keys, aligned with `author_name`.
    #[serde(default)]
    pub author_key: Vec<String>,
    pub first_publish_year: Option<i32>,
    #[serde(rename = "cover_i")]
    pub cover_id: Option<i64>,
    #[serde(default)]
    pub language: Vec<String>,
}

impl SearchDoc {
    pub fn first_author_key(&self) -> Option<&str> {
        first_non_blank(&self.author_key)
    }

    pub fn first_author_name(&self) -> Option<&str> {
        first_non_blank(&self.author_name)
    }

    pub fn first_language(&self) -> Option<&str> {
        first_non_blank(&self.language)
    }
}

fn first_non_blank(values: &[String]) -> Option<&str> {
    values
        .first()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}
