pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use literalura_catalog::{schema, AuthorView, BookSearch, CatalogService};
use literalura_http::AppError;
use literalura_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use models::AliveQuery;

/// Author listings.
pub struct AuthorsModule<S> {
    service: Arc<CatalogService<S>>,
}

impl<S> AuthorsModule<S> {
    pub fn new(service: Arc<CatalogService<S>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: BookSearch + 'static> Module for AuthorsModule<S> {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "authors module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_authors::<S>))
            .route("/alive", get(authors_alive::<S>))
            .route("/health", get(health_check))
            .with_state(self.service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let authors = json!({
            "description": "Authors",
            "content": {
                "application/json": {
                    "schema": { "type": "array", "items": { "$ref": "#/components/schemas/AuthorView" } }
                }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List all stored authors",
                        "tags": ["Authors"],
                        "responses": { "200": authors }
                    }
                },
                "/alive": {
                    "get": {
                        "summary": "Authors alive in a given year",
                        "tags": ["Authors"],
                        "parameters": [{
                            "name": "year", "in": "query", "required": true,
                            "schema": { "type": "integer", "minimum": 1 }
                        }],
                        "responses": {
                            "200": authors,
                            "422": {
                                "description": "Missing or non-positive year",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Authors health check",
                        "tags": ["Authors"],
                        "responses": { "200": { "description": "OK" } }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![schema::AUTHORS_INIT]
    }
}

async fn health_check() -> &'static str {
    "authors module is healthy"
}

async fn list_authors<S: BookSearch + 'static>(
    State(service): State<Arc<CatalogService<S>>>,
) -> Result<Json<Vec<AuthorView>>, AppError> {
    let authors = service.all_authors().await?;
    Ok(Json(authors.as_ref().clone()))
}

async fn authors_alive<S: BookSearch + 'static>(
    State(service): State<Arc<CatalogService<S>>>,
    Query(query): Query<AliveQuery>,
) -> Result<Json<Vec<AuthorView>>, AppError> {
    let year = query.year.ok_or_else(|| {
        AppError::validation(
            vec![json!({ "field": "year", "error": "required" })],
            "'year' is required",
        )
    })?;
    if year < 1 {
        return Err(AppError::validation(
            vec![json!({ "field": "year", "error": "must be positive" })],
            format!("'year' must be a positive integer, got {year}"),
        ));
    }
    let authors = service.authors_alive_in(year).await?;
    Ok(Json(authors.as_ref().clone()))
}
