pub mod models;
pub mod routes;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use literalura_catalog::{schema, AuthorView, BookSearch, BookView, CatalogService};
use literalura_kernel::{InitCtx, Migration, Module};
use serde_json::json;
use utoipa::PartialSchema;

use models::{LanguageCount, SearchRequest};

/// Title search, book listings and popularity ranking.
pub struct BooksModule<S> {
    service: Arc<CatalogService<S>>,
}

impl<S> BooksModule<S> {
    pub fn new(service: Arc<CatalogService<S>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: BookSearch + 'static> Module for BooksModule<S> {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            openlibrary = %ctx.settings.openlibrary.base_url,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(routes::list_books::<S>))
            .route(
                "/search",
                get(routes::search_by_query::<S>).post(routes::search_by_body::<S>),
            )
            .route("/language", get(routes::books_by_language::<S>))
            .route("/language/count", get(routes::count_by_language::<S>))
            .route("/top", get(routes::top_books::<S>))
            .route("/cache/invalidate", post(routes::invalidate_cache::<S>))
            .route("/health", get(routes::health_check))
            .with_state(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let books = json!({
            "description": "Books with their authors",
            "content": {
                "application/json": {
                    "schema": { "type": "array", "items": { "$ref": "#/components/schemas/BookView" } }
                }
            }
        });
        let book = json!({
            "description": "The stored book after reconciliation",
            "content": {
                "application/json": { "schema": { "$ref": "#/components/schemas/BookView" } }
            }
        });
        let lang_param = json!({
            "name": "lang", "in": "query", "required": true,
            "schema": { "type": "string" },
            "description": "Language code as stored, e.g. en or spa"
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List all stored books",
                        "tags": ["Books"],
                        "responses": { "200": books, "500": error("Internal server error") }
                    }
                },
                "/search": {
                    "get": {
                        "summary": "Search OpenLibrary by title and store the first hit",
                        "tags": ["Books"],
                        "parameters": [{
                            "name": "title", "in": "query", "required": true,
                            "schema": { "type": "string" }
                        }],
                        "responses": {
                            "200": book,
                            "404": error("No OpenLibrary results"),
                            "422": error("Blank title"),
                            "503": error("OpenLibrary unavailable")
                        }
                    },
                    "post": {
                        "summary": "Search OpenLibrary by title (JSON body)",
                        "tags": ["Books"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/SearchRequest" }
                                }
                            }
                        },
                        "responses": {
                            "200": book,
                            "404": error("No OpenLibrary results"),
                            "422": error("Blank title"),
                            "503": error("OpenLibrary unavailable")
                        }
                    }
                },
                "/language": {
                    "get": {
                        "summary": "Books in a language",
                        "tags": ["Books"],
                        "parameters": [lang_param],
                        "responses": { "200": books, "422": error("Blank language") }
                    }
                },
                "/language/count": {
                    "get": {
                        "summary": "Number of books in a language",
                        "tags": ["Books"],
                        "parameters": [lang_param],
                        "responses": {
                            "200": {
                                "description": "Count",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/LanguageCount" }
                                    }
                                }
                            },
                            "422": error("Blank language")
                        }
                    }
                },
                "/top": {
                    "get": {
                        "summary": "Five most searched books",
                        "tags": ["Books"],
                        "responses": { "200": books }
                    }
                },
                "/cache/invalidate": {
                    "post": {
                        "summary": "Drop every cached listing",
                        "tags": ["Books"],
                        "responses": { "204": { "description": "Cache cleared" } }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookView": BookView::schema(),
                    "AuthorView": AuthorView::schema(),
                    "SearchRequest": SearchRequest::schema(),
                    "LanguageCount": LanguageCount::schema()
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![schema::BOOKS_INIT]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}
