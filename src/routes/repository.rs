//! Repository info endpoint.
//!
//! GET /api/v1/repository
//!
//! Returns metadata about the attached repository: name, root path, HEAD
//! branch and whether work item enrichment is configured.

use axum::{Json, Router, extract::State, routing::get};

use crate::git::source::head_branch;
use crate::models::RepositoryInfo;
use crate::routes::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/repository", get(get_repository_info))
        .with_state(state)
}

async fn get_repository_info(State(state): State<AppState>) -> Json<RepositoryInfo> {
    let name = state
        .repo_root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    Json(RepositoryInfo {
        name,
        root: state.repo_root.display().to_string(),
        head_branch: head_branch(&state.repo_root).await,
        enrichment_configured: state.enrichment_configured,
    })
}
