//! Annotation DTOs.

use serde::Serialize;

/// Response for an annotation request on one line of a file.
#[derive(Debug, Serialize)]
pub struct AnnotationResponse {
    /// Repo-relative path of the file
    pub path: String,
    /// 1-based line number the annotation applies to
    pub line: u32,
    /// Rendered annotation, empty when the line has no attribution
    pub text: String,
    /// Hash of the attributed commit, if any
    pub commit: Option<String>,
    /// Badge form of the work item reference, e.g. `ADO#123`
    pub badge: Option<String>,
    /// True when a work item description was appended
    pub enriched: bool,
}
