//! Work item tracker integration.
//!
//! - `extract`: pulls work item identifiers out of commit summaries
//! - `workitems`: best-effort description lookups against Azure DevOps

pub mod extract;
pub mod workitems;

pub use extract::IdentifierExtractor;
pub use workitems::AdoClient;
