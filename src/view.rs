//! Display collaborators.
//!
//! The pipeline hands finished annotation text to a `View`. Rendering is
//! idempotent and last-write-wins, which is fine for a single request but
//! lets a slow resolution for an old selection overwrite a faster one for
//! the current selection. `SequencedView` closes that gap: updates carry a
//! monotonic sequence number and stale writes are dropped at the boundary.

use std::sync::atomic::{AtomicU64, Ordering};

pub trait View: Send + Sync {
    fn set_text(&self, text: &str);
    fn set_loading(&self, loading: bool);
}

/// Writes annotations to standard output, one line per update.
pub struct ConsoleView;

impl View for ConsoleView {
    fn set_text(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        println!("{text}");
    }

    fn set_loading(&self, _loading: bool) {
        // One-shot console output has no progress indicator.
    }
}

/// Ordering guard around any view. Requests call [`SequencedView::begin`]
/// before resolving and [`SequencedView::complete`] with the result; a
/// completion older than the newest one already rendered is discarded.
pub struct SequencedView<V> {
    inner: V,
    next: AtomicU64,
    rendered: AtomicU64,
}

impl<V: View> SequencedView<V> {
    pub fn new(inner: V) -> Self {
        Self {
            inner,
            next: AtomicU64::new(0),
            rendered: AtomicU64::new(0),
        }
    }

    /// Reserve the sequence number for a request about to start.
    pub fn begin(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Render a finished request unless a newer one already did.
    pub fn complete(&self, sequence: u64, text: &str) {
        let mut shown = self.rendered.load(Ordering::SeqCst);
        loop {
            if sequence < shown {
                return;
            }
            match self
                .rendered
                .compare_exchange(shown, sequence, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => break,
                Err(current) => shown = current,
            }
        }
        self.inner.set_text(text);
    }

    pub fn set_loading(&self, loading: bool) {
        self.inner.set_loading(loading);
    }
}
