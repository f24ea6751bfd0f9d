//! OpenLibrary HTTP client
//!
//! See: https://openlibrary.org/dev/docs/api/search

use std::time::Duration;

use literalura_kernel::settings::OpenLibrarySettings;

use super::dto::SearchResult;
use crate::error::{CatalogError, Result};

/// OpenLibrary asks API users to identify themselves.
const USER_AGENT: &str = concat!("LiterAlura/", env!("CARGO_PKG_VERSION"));

/// OpenLibrary search API client
#[derive(Debug, Clone)]
pub struct OpenLibraryClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OpenLibraryClient {
    /// Create a client from settings; every request is bounded by `timeout_ms`.
    pub fn new(settings: &OpenLibrarySettings) -> Result<Self> {
        let timeout = Duration::from_millis(settings.timeout_ms);
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::upstream(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /search.json?title=..&limit=..`
    pub async fn search(&self, title: &str, limit: u32) -> Result<SearchResult> {
        let url = format!("{}/search.json", self.base_url);
        tracing::debug!(%url, title, limit, "querying OpenLibrary");
        let limit = limit.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[("title", title), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::upstream(format!(
                "OpenLibrary answered HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<SearchResult>()
            .await
            .map_err(|e| CatalogError::upstream(format!("malformed OpenLibrary response: {e}")))
    }

    fn transport_error(&self, err: reqwest::Error) -> CatalogError {
        if err.is_timeout() {
            CatalogError::upstream(format!(
                "OpenLibrary did not answer within {} ms",
                self.timeout.as_millis()
            ))
        } else {
            CatalogError::upstream(format!("OpenLibrary request failed: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_configured_base_url() {
        let settings = OpenLibrarySettings {
            base_url: "http://localhost:8080/".to_string(),
            timeout_ms: 500,
        };
        let client = OpenLibraryClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_user_agent_format() {
        assert!(USER_AGENT.starts_with("LiterAlura/"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_upstream_unavailable() {
        let settings = OpenLibrarySettings {
            // Port 9 (discard) on localhost refuses connections.
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 500,
        };
        let client = OpenLibraryClient::new(&settings).unwrap();
        let err = client.search("Dune", 1).await.unwrap_err();
        assert!(matches!(err, CatalogError::UpstreamUnavailable(_)));
    }
}
