//! Navigation requests emitted by controllers.

use std::sync::Arc;

use parking_lot::Mutex;

/// Sign-in entry point.
pub const LOGIN_PATH: &str = "/login";
/// Shown to roles that may not open a page.
pub const UNAUTHORIZED_PATH: &str = "/un-authorized";

/// Receives hard navigations. The rendering layer owns the actual router.
pub trait Navigator: Send + Sync {
    /// Replace the current location with `path`, remembering `from` so the
    /// login page can send the user back.
    fn replace(&self, path: &str, from: Option<&str>);
}

/// One recorded navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Target path.
    pub to: String,
    /// Location the user was sent away from.
    pub from: Option<String>,
}

/// Keeps every redirect in order. Used by the CLI and by tests.
#[derive(Debug, Clone, Default)]
pub struct HistoryNavigator {
    entries: Arc<Mutex<Vec<Redirect>>>,
}

impl HistoryNavigator {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every redirect so far, oldest first.
    pub fn redirects(&self) -> Vec<Redirect> {
        self.entries.lock().clone()
    }

    /// Target of the latest redirect.
    pub fn last_path(&self) -> Option<String> {
        self.entries.lock().last().map(|entry| entry.to.clone())
    }
}

impl Navigator for HistoryNavigator {
    fn replace(&self, path: &str, from: Option<&str>) {
        tracing::info!(to = path, from = ?from, "navigate");
        self.entries.lock().push(Redirect {
            to: path.to_string(),
            from: from.map(str::to_string),
        });
    }
}
