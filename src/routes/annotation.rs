//! Annotation endpoint.
//!
//! GET /api/v1/annotation?path=<repo-relative path>&line=<1-based line>
//!
//! Resolves blame for the requested line and returns the rendered
//! annotation. A line without attribution (uncommitted content, line past
//! the end of the file) returns an empty `text`, not an error.
//!
//! Used by: editor front-ends reacting to selection changes

use std::path::{Component, Path};

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::AnnotationResponse;
use crate::routes::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/annotation", get(get_annotation))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AnnotationQuery {
    path: String,
    line: u32,
}

async fn get_annotation(
    State(state): State<AppState>,
    Query(query): Query<AnnotationQuery>,
) -> Result<Json<AnnotationResponse>> {
    validate_path(&query.path)?;

    let annotation = state.pipeline.resolve(&query.path, query.line).await;

    Ok(Json(AnnotationResponse {
        path: query.path,
        line: query.line,
        text: annotation.text,
        commit: annotation.commit,
        badge: annotation.badge,
        enriched: annotation.enriched,
    }))
}

/// Only repo-relative paths without parent traversal are accepted.
fn validate_path(path: &str) -> Result<()> {
    let candidate = Path::new(path);
    if path.is_empty()
        || candidate.is_absolute()
        || candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(AppError::InvalidPath(path.to_string()));
    }
    Ok(())
}
