//! Save status signal for the UI.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tokio::sync::watch;

/// What the autosave machinery is doing right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    /// Unsaved edits are waiting for the debounce window.
    Typing,
    /// A save is in flight.
    Saving,
    /// Everything is persisted.
    #[default]
    Saved,
    /// The last save failed.
    Error,
}

impl SaveStatus {
    /// Label for a status indicator.
    pub fn label(self) -> &'static str {
        match self {
            Self::Typing => "Typing...",
            Self::Saving => "Saving...",
            Self::Saved => "Saved",
            Self::Error => "Error saving",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Publishes the current [`SaveStatus`] and the last surfaced error.
pub struct StatusReporter {
    tx: watch::Sender<SaveStatus>,
    last_error: Mutex<Option<String>>,
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SaveStatus::default());
        Self {
            tx,
            last_error: Mutex::new(None),
        }
    }

    pub fn current(&self) -> SaveStatus {
        *self.tx.borrow()
    }

    /// A receiver that observes every subsequent status change.
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.tx.subscribe()
    }

    pub fn set(&self, status: SaveStatus) {
        self.tx.send_replace(status);
    }

    /// Sets [`SaveStatus::Error`] and records the message shown to the user.
    pub fn fail(&self, message: String) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = Some(message);
        self.set(SaveStatus::Error);
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}
