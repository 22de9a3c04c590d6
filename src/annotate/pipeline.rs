//! Annotation resolution pipeline.
//!
//! Orchestrates the blame store, the formatter and the work item lookup
//! for one (file, line) request. Failures never escape this boundary:
//! anything that prevents an attribution yields a cleared annotation and
//! the cause is logged.

use std::sync::Arc;

use chrono::Utc;

use crate::annotate::formatter;
use crate::git::store::BlameStore;
use crate::tracker::extract::IdentifierExtractor;
use crate::tracker::workitems::WorkItemLookup;

/// Result of one resolution. `text` is empty when the line has no
/// attributable commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub text: String,
    pub commit: Option<String>,
    /// Badge form of the work item reference, e.g. `ADO#123`.
    pub badge: Option<String>,
    /// True when a work item description was appended to the base text.
    pub enriched: bool,
}

impl Annotation {
    fn cleared() -> Self {
        Self::default()
    }

    pub fn is_cleared(&self) -> bool {
        self.text.is_empty()
    }
}

pub struct BlamePipeline<L> {
    store: Arc<BlameStore>,
    extractor: IdentifierExtractor,
    lookup: L,
}

impl<L: WorkItemLookup> BlamePipeline<L> {
    pub fn new(store: Arc<BlameStore>, extractor: IdentifierExtractor, lookup: L) -> Self {
        Self {
            store,
            extractor,
            lookup,
        }
    }

    /// Resolve the annotation for a 1-based line of a repo-relative file.
    pub async fn resolve(&self, file: &str, line: u32) -> Annotation {
        self.resolve_at(file, line, Utc::now().timestamp()).await
    }

    /// Like [`BlamePipeline::resolve`], with a fixed reference time.
    pub async fn resolve_at(&self, file: &str, line: u32, now: i64) -> Annotation {
        if self.store.needs_population(file) {
            tracing::info!("first blame request for {}", file);
        }

        let record = match self.store.get(file).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("blame lookup for {} failed: {}", file, e);
                return Annotation::cleared();
            }
        };

        // An uncommitted or out-of-range line has no attribution; that is
        // a normal outcome, not an error.
        let Some(commit) = record.commit_for_line(line) else {
            return Annotation::cleared();
        };

        let mut annotation = Annotation {
            text: formatter::format_annotation(commit, now),
            commit: Some(commit.hash.clone()),
            badge: formatter::ticket_badge(&self.extractor, &commit.summary),
            enriched: false,
        };

        if let Some(id) = self.extractor.extract(&commit.summary) {
            if let Some(description) = self.lookup.fetch_description(id).await {
                annotation.text.push_str(&format!("\nWork Item #{id}:\n{description}"));
                annotation.enriched = true;
            }
        }

        annotation
    }
}
