//! Per-file blame cache.
//!
//! Caches the assembled blame record for every file that has been looked
//! up, one store per opened repository. A record is built by draining the
//! source's event stream once, installed wholesale and never patched in
//! place afterwards. There is no eviction: once cached, a record stays for
//! the life of the store even if the underlying history moves on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

use crate::error::{AppError, Result};
use crate::git::source::{BlameEvent, BlameSource};

/// Metadata for one commit appearing in a file's blame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub hash: String,
    pub author: String,
    pub author_time: i64,
    pub summary: String,
    /// Display timestamp. Falls back to `author_time` when the source
    /// does not supply a separate commit time, so it is always set.
    pub time: i64,
}

/// Fully assembled blame for one file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlameRecord {
    /// 1-based final line number → commit hash.
    pub line_to_commit: HashMap<u32, String>,
    /// Commit hash → metadata. First emission wins; later duplicates for
    /// the same hash are dropped.
    pub commits: HashMap<String, CommitInfo>,
}

impl BlameRecord {
    pub fn commit_for_line(&self, line: u32) -> Option<&CommitInfo> {
        let hash = self.line_to_commit.get(&line)?;
        self.commits.get(hash)
    }
}

/// Cache of blame records keyed by repo-relative file path.
pub struct BlameStore {
    source: Arc<dyn BlameSource>,
    records: Mutex<HashMap<String, Arc<BlameRecord>>>,
    /// Per-path population gates. Concurrent requests for the same
    /// uncached path serialize here; whoever populates first fans the
    /// record out to the rest through the cache.
    gates: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl BlameStore {
    pub fn new(source: Arc<dyn BlameSource>) -> Self {
        Self {
            source,
            records: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// True until a record has been cached for `file`.
    pub fn needs_population(&self, file: &str) -> bool {
        self.records
            .lock()
            .map(|records| !records.contains_key(file))
            .unwrap_or(true)
    }

    /// Get the blame record for `file`, populating it from the source on
    /// first request. A failed population caches nothing; the next call
    /// starts over from scratch.
    pub async fn get(&self, file: &str) -> Result<Arc<BlameRecord>> {
        if let Some(record) = self.cached(file)? {
            return Ok(record);
        }

        let gate = self.gate(file)?;
        let _population = gate.lock().await;

        // A request that held the gate before us may have installed the
        // record while we waited.
        if let Some(record) = self.cached(file)? {
            return Ok(record);
        }

        tracing::debug!("populating blame for {}", file);
        let record = Arc::new(self.populate(file).await?);
        self.records
            .lock()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?
            .insert(file.to_string(), record.clone());

        Ok(record)
    }

    fn cached(&self, file: &str) -> Result<Option<Arc<BlameRecord>>> {
        Ok(self
            .records
            .lock()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?
            .get(file)
            .cloned())
    }

    fn gate(&self, file: &str) -> Result<Arc<AsyncMutex<()>>> {
        Ok(self
            .gates
            .lock()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?
            .entry(file.to_string())
            .or_default()
            .clone())
    }

    /// Drain the source's stream into a fresh record.
    async fn populate(&self, file: &str) -> Result<BlameRecord> {
        let mut events = self.source.stream(file);
        let mut record = BlameRecord::default();

        while let Some(event) = events.recv().await {
            match event {
                BlameEvent::Line { final_line, hash } => {
                    record.line_to_commit.insert(final_line, hash);
                }
                BlameEvent::Commit {
                    hash,
                    author,
                    author_time,
                    summary,
                    time,
                } => {
                    record
                        .commits
                        .entry(hash.clone())
                        .or_insert_with(|| CommitInfo {
                            hash,
                            author,
                            author_time,
                            summary,
                            time: time.unwrap_or(author_time),
                        });
                }
                BlameEvent::Error { message } => {
                    return Err(AppError::DataSource(message));
                }
                BlameEvent::End => return Ok(record),
            }
        }

        Err(AppError::DataSource(
            "blame stream closed without an end signal".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    const HASH: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    /// Source that replays one scripted event sequence per invocation and
    /// counts how many times it was asked to stream.
    struct ScriptedSource {
        scripts: Mutex<Vec<Vec<BlameEvent>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(scripts: Vec<Vec<BlameEvent>>) -> Self {
            Self {
                scripts: Mutex::new(scripts),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl BlameSource for ScriptedSource {
        fn stream(&self, _file: &str) -> mpsc::Receiver<BlameEvent> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let script = {
                let mut scripts = self.scripts.lock().unwrap();
                if scripts.is_empty() {
                    Vec::new()
                } else {
                    scripts.remove(0)
                }
            };

            let (tx, rx) = mpsc::channel(16);
            tokio::spawn(async move {
                for event in script {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            });
            rx
        }
    }

    fn line(final_line: u32) -> BlameEvent {
        BlameEvent::Line {
            final_line,
            hash: HASH.to_string(),
        }
    }

    fn commit(summary: &str, time: Option<i64>) -> BlameEvent {
        BlameEvent::Commit {
            hash: HASH.to_string(),
            author: "Alice".to_string(),
            author_time: 1_234_567_890,
            summary: summary.to_string(),
            time,
        }
    }

    #[tokio::test]
    async fn caches_record_and_invokes_source_once() {
        let source = Arc::new(ScriptedSource::new(vec![vec![
            line(1),
            commit("Test commit", None),
            BlameEvent::End,
        ]]));
        let store = BlameStore::new(source.clone());

        assert!(store.needs_population("test.rs"));

        let first = store.get("test.rs").await.unwrap();
        let second = store.get("test.rs").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls(), 1);
        assert!(!store.needs_population("test.rs"));
    }

    #[tokio::test]
    async fn missing_commit_time_falls_back_to_author_timestamp() {
        let source = Arc::new(ScriptedSource::new(vec![vec![
            line(1),
            commit("Test commit", None),
            BlameEvent::End,
        ]]));
        let store = BlameStore::new(source);

        let record = store.get("test.rs").await.unwrap();
        assert_eq!(record.commits[HASH].time, 1_234_567_890);
    }

    #[tokio::test]
    async fn explicit_commit_time_is_kept() {
        let source = Arc::new(ScriptedSource::new(vec![vec![
            commit("Test commit", Some(1_234_567_999)),
            BlameEvent::End,
        ]]));
        let store = BlameStore::new(source);

        let record = store.get("test.rs").await.unwrap();
        assert_eq!(record.commits[HASH].time, 1_234_567_999);
    }

    #[tokio::test]
    async fn duplicate_commit_events_keep_first_occurrence() {
        let source = Arc::new(ScriptedSource::new(vec![vec![
            commit("first wins", None),
            commit("later duplicate", Some(42)),
            BlameEvent::End,
        ]]));
        let store = BlameStore::new(source);

        let record = store.get("test.rs").await.unwrap();
        assert_eq!(record.commits[HASH].summary, "first wins");
    }

    #[tokio::test]
    async fn stream_error_is_not_cached_and_retry_succeeds() {
        let source = Arc::new(ScriptedSource::new(vec![
            vec![line(1), BlameEvent::Error {
                message: "boom".to_string(),
            }],
            vec![line(1), commit("Test commit", None), BlameEvent::End],
        ]));
        let store = BlameStore::new(source.clone());

        let err = store.get("test.rs").await.unwrap_err();
        assert!(matches!(err, AppError::DataSource(_)));
        assert!(store.needs_population("test.rs"));

        let record = store.get("test.rs").await.unwrap();
        assert_eq!(record.line_to_commit[&1], HASH);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn closed_stream_without_end_signal_is_an_error() {
        let source = Arc::new(ScriptedSource::new(vec![vec![line(1)]]));
        let store = BlameStore::new(source);

        let err = store.get("test.rs").await.unwrap_err();
        assert!(matches!(err, AppError::DataSource(_)));
    }

    #[tokio::test]
    async fn concurrent_requests_for_same_file_populate_once() {
        let source = Arc::new(ScriptedSource::new(vec![vec![
            line(1),
            commit("Test commit", None),
            BlameEvent::End,
        ]]));
        let store = Arc::new(BlameStore::new(source.clone()));

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.get("test.rs").await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.get("test.rs").await })
        };

        let first = a.await.unwrap().unwrap();
        let second = b.await.unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn records_are_kept_per_file() {
        let source = Arc::new(ScriptedSource::new(vec![
            vec![line(1), commit("one", None), BlameEvent::End],
            vec![line(2), commit("two", None), BlameEvent::End],
        ]));
        let store = BlameStore::new(source.clone());

        let first = store.get("a.rs").await.unwrap();
        let second = store.get("b.rs").await.unwrap();

        assert!(first.line_to_commit.contains_key(&1));
        assert!(second.line_to_commit.contains_key(&2));
        assert_eq!(source.calls(), 2);
    }
}
