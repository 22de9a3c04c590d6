//! Streaming blame data source.
//!
//! Runs `git blame --porcelain` for one file and turns its output into a
//! finite sequence of typed events. The stream is consumed exactly once by
//! the blame store; it is not restartable. The porcelain parser is a pure
//! function over output lines so it can be exercised without a checkout.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

/// One event from the blame stream.
///
/// `Line` attributes a final line number to a commit hash. `Commit`
/// carries the metadata for a hash and is emitted once, when the hash
/// first appears with headers in the output. `time` is the commit time
/// when the source supplies one; consumers fall back to the author
/// timestamp otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlameEvent {
    Line {
        final_line: u32,
        hash: String,
    },
    Commit {
        hash: String,
        author: String,
        author_time: i64,
        summary: String,
        time: Option<i64>,
    },
    Error {
        message: String,
    },
    End,
}

/// A source of blame events for files under one repository.
pub trait BlameSource: Send + Sync {
    /// Start streaming blame for a repo-relative file path. The returned
    /// channel yields events until `Error` or `End`, then closes.
    fn stream(&self, file: &str) -> mpsc::Receiver<BlameEvent>;
}

/// `BlameSource` backed by the `git blame --porcelain` subprocess.
pub struct GitBlameProcess {
    repo_root: PathBuf,
}

impl GitBlameProcess {
    pub fn new(repo_root: PathBuf) -> Self {
        Self { repo_root }
    }
}

impl BlameSource for GitBlameProcess {
    fn stream(&self, file: &str) -> mpsc::Receiver<BlameEvent> {
        let (tx, rx) = mpsc::channel(64);
        let repo_root = self.repo_root.clone();
        let file = file.to_string();

        tokio::spawn(run_blame(repo_root, file, tx));

        rx
    }
}

async fn run_blame(repo_root: PathBuf, file: String, tx: mpsc::Sender<BlameEvent>) {
    let spawned = Command::new("git")
        .current_dir(&repo_root)
        .args(["blame", "--porcelain", "--"])
        .arg(&file)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            send(&tx, BlameEvent::Error {
                message: format!("failed to spawn git blame: {e}"),
            })
            .await;
            return;
        }
    };

    let Some(stdout) = child.stdout.take() else {
        send(&tx, BlameEvent::Error {
            message: "git blame produced no output handle".to_string(),
        })
        .await;
        return;
    };

    // Drain stderr concurrently so a chatty process can never block on a
    // full pipe while we read stdout.
    let stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_string(&mut buf).await;
        }
        buf
    });

    let mut parser = PorcelainParser::new();
    let mut lines = BufReader::new(stdout).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                for event in parser.feed(&line) {
                    if tx.send(event).await.is_err() {
                        return; // receiver gone, stop reading
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                send(&tx, BlameEvent::Error {
                    message: format!("failed to read git blame output: {e}"),
                })
                .await;
                return;
            }
        }
    }

    match child.wait().await {
        Ok(status) if status.success() => {
            for event in parser.finish() {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            send(&tx, BlameEvent::End).await;
        }
        Ok(status) => {
            let detail = stderr_task.await.unwrap_or_default();
            send(&tx, BlameEvent::Error {
                message: format!("git blame exited with {}: {}", status, detail.trim()),
            })
            .await;
        }
        Err(e) => {
            send(&tx, BlameEvent::Error {
                message: format!("failed to wait for git blame: {e}"),
            })
            .await;
        }
    }
}

async fn send(tx: &mpsc::Sender<BlameEvent>, event: BlameEvent) {
    let _ = tx.send(event).await;
}

/// Current branch name via `git rev-parse`, `None` for a detached HEAD or
/// when git is unavailable.
pub async fn head_branch(repo_root: &Path) -> Option<String> {
    let output = Command::new("git")
        .current_dir(repo_root)
        .args(["rev-parse", "--abbrev-ref", "HEAD"])
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let name = String::from_utf8(output.stdout).ok()?;
    let name = name.trim();
    if name.is_empty() || name == "HEAD" {
        None
    } else {
        Some(name.to_string())
    }
}

/// Incremental parser for `git blame --porcelain` output.
///
/// Every group of lines starts with `<hash> <orig-line> <final-line>
/// [<group-size>]`. Header lines such as `author`, `author-time`,
/// `committer-time` and `summary` follow the first group of each commit
/// only; file content lines are prefixed with a tab.
#[derive(Default)]
pub struct PorcelainParser {
    pending: Option<PendingCommit>,
}

struct PendingCommit {
    hash: String,
    author: Option<String>,
    author_time: Option<i64>,
    summary: Option<String>,
    time: Option<i64>,
}

impl PendingCommit {
    fn new(hash: String) -> Self {
        Self {
            hash,
            author: None,
            author_time: None,
            summary: None,
            time: None,
        }
    }

    fn has_metadata(&self) -> bool {
        self.author.is_some() || self.author_time.is_some() || self.summary.is_some()
    }
}

impl PorcelainParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one output line, producing zero or more events.
    pub fn feed(&mut self, line: &str) -> Vec<BlameEvent> {
        // File content; attribution for it was already emitted.
        if line.starts_with('\t') {
            return Vec::new();
        }

        if let Some((hash, final_line)) = parse_group_header(line) {
            let mut events = self.flush();
            events.push(BlameEvent::Line {
                final_line,
                hash: hash.clone(),
            });
            self.pending = Some(PendingCommit::new(hash));
            return events;
        }

        if let Some(pending) = self.pending.as_mut() {
            if let Some(author) = line.strip_prefix("author ") {
                pending.author = Some(author.to_string());
            } else if let Some(time) = line.strip_prefix("author-time ") {
                pending.author_time = time.trim().parse().ok();
            } else if let Some(time) = line.strip_prefix("committer-time ") {
                pending.time = time.trim().parse().ok();
            } else if let Some(summary) = line.strip_prefix("summary ") {
                pending.summary = Some(summary.to_string());
            }
            // Remaining headers (mail, tz, filename, boundary, ...) are
            // not part of the event schema.
        }

        Vec::new()
    }

    /// Flush any trailing commit metadata at end of output.
    pub fn finish(&mut self) -> Vec<BlameEvent> {
        self.flush()
    }

    fn flush(&mut self) -> Vec<BlameEvent> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };

        // Groups repeating an already-described hash carry no headers and
        // produce no commit event.
        if !pending.has_metadata() {
            return Vec::new();
        }

        let author_time = pending.author_time.unwrap_or(0);
        vec![BlameEvent::Commit {
            hash: pending.hash,
            author: pending.author.unwrap_or_else(|| "Unknown".to_string()),
            author_time,
            summary: pending.summary.unwrap_or_default(),
            time: pending.time,
        }]
    }
}

/// Parse a `<hash> <orig-line> <final-line> [<group-size>]` group header.
fn parse_group_header(line: &str) -> Option<(String, u32)> {
    let mut parts = line.split_ascii_whitespace();
    let hash = parts.next()?;
    if hash.len() != 40 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let _orig_line = parts.next()?;
    let final_line = parts.next()?.parse().ok()?;
    Some((hash.to_string(), final_line))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn parse_all(output: &str) -> Vec<BlameEvent> {
        let mut parser = PorcelainParser::new();
        let mut events: Vec<BlameEvent> = output.lines().flat_map(|l| parser.feed(l)).collect();
        events.extend(parser.finish());
        events
    }

    #[test]
    fn parses_lines_and_commit_metadata() {
        let output = format!(
            "{HASH_A} 1 1 2\n\
             author Alice\n\
             author-mail <alice@example.com>\n\
             author-time 1700000000\n\
             author-tz +0000\n\
             committer Bob\n\
             committer-time 1700000100\n\
             summary Fix bug #123\n\
             filename src/lib.rs\n\
             \tfn main() {{}}\n\
             {HASH_A} 2 2\n\
             \tsecond line\n"
        );

        let events = parse_all(&output);
        assert_eq!(events, vec![
            BlameEvent::Line {
                final_line: 1,
                hash: HASH_A.to_string(),
            },
            BlameEvent::Commit {
                hash: HASH_A.to_string(),
                author: "Alice".to_string(),
                author_time: 1_700_000_000,
                summary: "Fix bug #123".to_string(),
                time: Some(1_700_000_100),
            },
            BlameEvent::Line {
                final_line: 2,
                hash: HASH_A.to_string(),
            },
        ]);
    }

    #[test]
    fn commit_without_committer_time_has_no_explicit_time() {
        let output = format!(
            "{HASH_B} 1 7 1\n\
             author Carol\n\
             author-time 1600000000\n\
             summary Refactor helper\n\
             filename src/lib.rs\n\
             \tlet x = 1;\n"
        );

        let events = parse_all(&output);
        assert_eq!(events[1], BlameEvent::Commit {
            hash: HASH_B.to_string(),
            author: "Carol".to_string(),
            author_time: 1_600_000_000,
            summary: "Refactor helper".to_string(),
            time: None,
        });
    }

    #[test]
    fn interleaved_commits_flush_in_order() {
        let output = format!(
            "{HASH_A} 1 1 1\n\
             author Alice\n\
             author-time 100\n\
             summary first\n\
             \tone\n\
             {HASH_B} 2 2 1\n\
             author Bob\n\
             author-time 200\n\
             summary second\n\
             \ttwo\n\
             {HASH_A} 3 3 1\n\
             \tthree\n"
        );

        let events = parse_all(&output);
        let lines: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, BlameEvent::Line { .. }))
            .collect();
        let commits: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, BlameEvent::Commit { .. }))
            .collect();

        assert_eq!(lines.len(), 3);
        // The repeated group for the first hash carries no headers and
        // must not produce a second commit event.
        assert_eq!(commits.len(), 2);
    }

    #[test]
    fn content_lines_resembling_headers_are_ignored() {
        let mut parser = PorcelainParser::new();
        assert!(parser.feed("\tauthor not-a-header").is_empty());
        assert!(parser.feed("\tsummary also content").is_empty());
        assert!(parser.finish().is_empty());
    }

    #[test]
    fn rejects_malformed_group_headers() {
        assert_eq!(parse_group_header("author Alice"), None);
        assert_eq!(parse_group_header("deadbeef 1 1"), None); // short hash
        assert_eq!(parse_group_header(&format!("{HASH_A} 1")), None);
        assert_eq!(
            parse_group_header(&format!("{HASH_A} 4 7 2")),
            Some((HASH_A.to_string(), 7))
        );
    }
}
