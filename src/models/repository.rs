//! Repository DTOs.

use serde::Serialize;

/// Metadata for the repository the server is attached to.
#[derive(Debug, Serialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub root: String,
    pub head_branch: Option<String>,
    /// Whether work item enrichment is configured
    pub enrichment_configured: bool,
}
