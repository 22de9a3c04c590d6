//! Data transfer objects (DTOs) for API responses.
//!
//! These structs are serialized to JSON for editor front-ends.
//! - `annotation`: AnnotationResponse for resolved line annotations
//! - `repository`: RepositoryInfo for the attached repository

pub mod annotation;
pub mod repository;

pub use annotation::*;
pub use repository::*;
