//! Handlers for `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use literalura_catalog::{model::language_display, BookSearch, BookView, CatalogService};
use literalura_http::AppError;
use serde_json::json;

use super::models::{LanguageCount, LanguageQuery, SearchQuery, SearchRequest};

type Service<S> = State<Arc<CatalogService<S>>>;

pub async fn health_check() -> &'static str {
    "books module is healthy"
}

pub async fn search_by_query<S: BookSearch + 'static>(
    State(service): Service<S>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<BookView>, AppError> {
    let title = required("title", query.title.as_deref())?;
    Ok(Json(service.search(title).await?))
}

pub async fn search_by_body<S: BookSearch + 'static>(
    State(service): Service<S>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<BookView>, AppError> {
    let title = required("title", Some(&request.title))?;
    Ok(Json(service.search(title).await?))
}

pub async fn list_books<S: BookSearch + 'static>(
    State(service): Service<S>,
) -> Result<Json<Vec<BookView>>, AppError> {
    let books = service.all_books().await?;
    Ok(Json(books.as_ref().clone()))
}

pub async fn books_by_language<S: BookSearch + 'static>(
    State(service): Service<S>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<Vec<BookView>>, AppError> {
    let lang = required("lang", query.lang.as_deref())?;
    let books = service.books_by_language(lang).await?;
    Ok(Json(books.as_ref().clone()))
}

pub async fn count_by_language<S: BookSearch + 'static>(
    State(service): Service<S>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<LanguageCount>, AppError> {
    let lang = required("lang", query.lang.as_deref())?;
    let count = service.count_by_language(lang).await?;
    Ok(Json(LanguageCount {
        language: lang.to_string(),
        language_display: language_display(lang),
        count,
    }))
}

pub async fn top_books<S: BookSearch + 'static>(
    State(service): Service<S>,
) -> Result<Json<Vec<BookView>>, AppError> {
    let books = service.top_books().await?;
    Ok(Json(books.as_ref().clone()))
}

pub async fn invalidate_cache<S: BookSearch + 'static>(State(service): Service<S>) -> StatusCode {
    service.invalidate_cache();
    StatusCode::NO_CONTENT
}

/// Reject missing or blank parameters with a field-level validation error.
fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, AppError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::validation(
            vec![json!({ "field": field, "error": "required" })],
            format!("'{field}' must not be blank"),
        )),
    }
}
