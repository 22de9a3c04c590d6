//! Annotation text rendering.
//!
//! Turns commit metadata into the line shown next to the current
//! selection: `<summary> - <author> (<relative time>)`. A badge-only mode
//! exists for callers that just want the work item reference.

use crate::git::store::CommitInfo;
use crate::tracker::extract::IdentifierExtractor;

/// Render the base annotation for a commit relative to `now` (seconds
/// since epoch). Deterministic for a fixed `now`.
pub fn format_annotation(commit: &CommitInfo, now: i64) -> String {
    format!(
        "{} - {} ({})",
        commit.summary,
        commit.author,
        format_relative_time(commit.time, now)
    )
}

/// Badge-only presentation: `ADO#<id>` when the summary references a work
/// item, nothing otherwise.
pub fn ticket_badge(extractor: &IdentifierExtractor, summary: &str) -> Option<String> {
    extractor.extract(summary).map(|id| format!("ADO#{id}"))
}

pub fn format_relative_time(then: i64, now: i64) -> String {
    let diff = (now - then).max(0);

    if diff < 60 {
        plural(diff, "second")
    } else if diff < 3600 {
        plural(diff / 60, "minute")
    } else if diff < 86400 {
        plural(diff / 3600, "hour")
    } else if diff < 2592000 {
        plural(diff / 86400, "day")
    } else if diff < 31536000 {
        plural(diff / 2592000, "month")
    } else {
        plural(diff / 31536000, "year")
    }
}

fn plural(count: i64, unit: &str) -> String {
    format!("{} {}{} ago", count, unit, if count == 1 { "" } else { "s" })
}
