//! API route handlers - maps HTTP endpoints to the annotation pipeline.
//!
//! - `repository`: Basic repo info (GET /api/v1/repository)
//! - `annotation`: Line annotation resolution (GET /api/v1/annotation)

pub mod annotation;
pub mod repository;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;

use crate::annotate::BlamePipeline;
use crate::tracker::AdoClient;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<BlamePipeline<AdoClient>>,
    pub repo_root: PathBuf,
    pub enrichment_configured: bool,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(repository::routes(state.clone()))
        .merge(annotation::routes(state))
}
