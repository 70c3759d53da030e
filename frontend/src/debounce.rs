//! Debounced search filter.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

/// Raw and committed value of a search box.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    /// Latest keystroke value.
    pub raw: String,
    /// Value actually used for filtering and fetching.
    pub committed: String,
}

struct FilterShared {
    state: Mutex<FilterState>,
    committed_tx: watch::Sender<String>,
    commits: AtomicU64,
}

impl FilterShared {
    fn commit(&self) {
        let value = {
            let mut state = self.state.lock();
            state.committed = state.raw.clone();
            state.committed.clone()
        };
        self.commits.fetch_add(1, Ordering::SeqCst);
        debug!(committed = %value, "filter committed");
        self.committed_tx.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }
}

/// Scheduled commit. Dropping it cancels the timer.
struct PendingCommit(JoinHandle<()>);

impl Drop for PendingCommit {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Turns keystrokes into a committed value once input has been quiet for
/// the configured interval. At most one commit timer exists at a time; it
/// is cancelled by a superseding input, by [`DebouncedFilter::cancel_pending`]
/// and when the filter is dropped.
pub struct DebouncedFilter {
    quiet: Duration,
    shared: Arc<FilterShared>,
    pending: Mutex<Option<PendingCommit>>,
}

impl DebouncedFilter {
    /// Filter committing after `quiet` of silence.
    pub fn new(quiet: Duration) -> Self {
        let (committed_tx, _) = watch::channel(String::new());
        Self {
            quiet,
            shared: Arc::new(FilterShared {
                state: Mutex::new(FilterState::default()),
                committed_tx,
                commits: AtomicU64::new(0),
            }),
            pending: Mutex::new(None),
        }
    }

    /// Silence required before a commit.
    pub fn quiet_interval(&self) -> Duration {
        self.quiet
    }

    /// Records `raw` now and (re)schedules the commit. Must run inside a
    /// tokio runtime.
    pub fn on_input(&self, raw: impl Into<String>) {
        let raw = raw.into();
        self.shared.state.lock().raw = raw;

        let mut pending = self.pending.lock();
        // Drop first so the superseded timer is gone before the new one starts.
        pending.take();
        let shared = Arc::clone(&self.shared);
        let quiet = self.quiet;
        *pending = Some(PendingCommit(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            shared.commit();
        })));
    }

    /// Commits the current raw value immediately.
    pub fn flush(&self) {
        self.pending.lock().take();
        self.shared.commit();
    }

    /// Cancels the scheduled commit, if any. The raw value is kept.
    pub fn cancel_pending(&self) {
        if self.pending.lock().take().is_some() {
            debug!("pending filter commit cancelled");
        }
    }

    /// Whether a commit is scheduled and has not fired yet.
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|pending| !pending.0.is_finished())
    }

    /// Snapshot of both values.
    pub fn state(&self) -> FilterState {
        self.shared.state.lock().clone()
    }

    /// Value last committed.
    pub fn committed(&self) -> String {
        self.shared.state.lock().committed.clone()
    }

    /// Number of commits so far, including ones that did not change the value.
    pub fn commit_count(&self) -> u64 {
        self.shared.commits.load(Ordering::SeqCst)
    }

    /// Notified whenever the committed value changes.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.shared.committed_tx.subscribe()
    }
}

impl Drop for DebouncedFilter {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
