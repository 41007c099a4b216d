//! The editing session: ties tracker, scheduler, executor and status together.

use crate::field::FieldSource;
use crate::preference::AutosavePreference;
use crate::scheduler::DebounceScheduler;
use crate::status::{SaveStatus, StatusReporter};
use crate::tracker::FieldChangeTracker;
use owt_backend::ElementBackend;
use owt_model::Element;
use owt_storage::StorageResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Default inactivity window before an autosave fires.
pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;

/// Autosave configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutosaveConfig {
    /// Inactivity window (ms) between the last edit and the save.
    pub debounce_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl AutosaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Notified synchronously after a save result is merged into the element.
pub trait UpdateObserver: Send + Sync {
    fn element_updated(&self, element: &Element);
}

impl<F> UpdateObserver for F
where
    F: Fn(&Element) + Send + Sync,
{
    fn element_updated(&self, element: &Element) {
        self(element)
    }
}

pub(crate) struct SessionState {
    pub(crate) tracker: FieldChangeTracker,
    /// Bumped whenever the session is replaced or ended; results tagged
    /// with an older generation are dropped.
    pub(crate) generation: u64,
    pub(crate) in_flight: bool,
    /// Fields carried by the in-flight bulk save.
    pub(crate) sending: BTreeSet<String>,
    /// Fields edited while the bulk save was in flight.
    pub(crate) touched_in_flight: BTreeSet<String>,
    pub(crate) paused: bool,
}

pub(crate) struct Inner {
    pub(crate) config: AutosaveConfig,
    pub(crate) backend: Arc<dyn ElementBackend>,
    pub(crate) source: Arc<dyn FieldSource>,
    pub(crate) observer: Option<Arc<dyn UpdateObserver>>,
    pub(crate) preference: AutosavePreference,
    pub(crate) status: StatusReporter,
    pub(crate) scheduler: DebounceScheduler,
    pub(crate) state: Mutex<SessionState>,
}

impl Inner {
    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Builder for [`AutosaveSession`].
pub struct AutosaveSessionBuilder {
    config: AutosaveConfig,
    backend: Arc<dyn ElementBackend>,
    source: Arc<dyn FieldSource>,
    observer: Option<Arc<dyn UpdateObserver>>,
    preference: AutosavePreference,
}

impl AutosaveSessionBuilder {
    pub fn config(mut self, config: AutosaveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn preference(mut self, preference: AutosavePreference) -> Self {
        self.preference = preference;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn UpdateObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> AutosaveSession {
        let scheduler = DebounceScheduler::new(self.config.debounce());
        AutosaveSession {
            inner: Arc::new(Inner {
                config: self.config,
                backend: self.backend,
                source: self.source,
                observer: self.observer,
                preference: self.preference,
                status: StatusReporter::new(),
                scheduler,
                state: Mutex::new(SessionState {
                    tracker: FieldChangeTracker::new(),
                    generation: 0,
                    in_flight: false,
                    sending: BTreeSet::new(),
                    touched_in_flight: BTreeSet::new(),
                    paused: false,
                }),
            }),
        }
    }
}

/// Autosaving editor session for one element at a time.
///
/// Cheap to clone; clones share the same session. Operations that arm the
/// debounce timer must run inside a tokio runtime.
#[derive(Clone)]
pub struct AutosaveSession {
    pub(crate) inner: Arc<Inner>,
}

impl AutosaveSession {
    pub fn builder(
        backend: Arc<dyn ElementBackend>,
        source: Arc<dyn FieldSource>,
    ) -> AutosaveSessionBuilder {
        AutosaveSessionBuilder {
            config: AutosaveConfig::default(),
            backend,
            source,
            observer: None,
            preference: AutosavePreference::default(),
        }
    }

    // ── Session lifecycle ────────────────────────────────────────

    /// Starts editing `element`, replacing any previous session state.
    pub fn begin_session(&self, element: Element) {
        self.inner.scheduler.cancel();
        let mut state = self.inner.lock();
        info!("Editing {} {}", element.element_type, element.id);
        state.generation += 1;
        state.tracker.begin(element);
        state.in_flight = false;
        state.sending.clear();
        state.touched_in_flight.clear();
        drop(state);
        self.inner.status.set(SaveStatus::Saved);
    }

    /// Stops editing: cancels the pending timer and discards all state.
    pub fn end_session(&self) {
        self.inner.scheduler.cancel();
        let mut state = self.inner.lock();
        state.generation += 1;
        state.tracker.end();
        state.in_flight = false;
        state.sending.clear();
        state.touched_in_flight.clear();
        drop(state);
        self.inner.status.set(SaveStatus::Saved);
    }

    // ── Change tracking ──────────────────────────────────────────

    /// Records an edit of `field` and (re)arms the debounce timer.
    pub fn on_field_changed(&self, field: &str) {
        if !self.inner.preference.is_enabled() {
            return;
        }
        if self.inner.source.read(field).is_none() {
            warn!("Ignoring change to {:?}: no input for it", field);
            return;
        }
        let generation = {
            let mut state = self.inner.lock();
            if state.paused {
                return;
            }
            if !state.tracker.mark_dirty(field) {
                if state.tracker.is_active() {
                    warn!("Ignoring change to unknown field {:?}", field);
                }
                return;
            }
            if state.in_flight {
                state.touched_in_flight.insert(field.to_string());
            }
            state.generation
        };
        self.inner.source.set_dirty_marker(field, true);
        self.inner.status.set(SaveStatus::Typing);
        self.arm(generation);
    }

    /// Restores `field`'s input to its last saved value and un-dirties it.
    ///
    /// If the in-flight save is sending `field`, the field stays dirty so
    /// the restored value is written back once that save lands.
    ///
    /// Returns false when there is no saved value to restore.
    pub fn revert_field(&self, field: &str) -> bool {
        let (saved, still_dirty, clean) = {
            let mut state = self.inner.lock();
            let Some(saved) = state.tracker.revert(field) else {
                return false;
            };
            let still_dirty = state.in_flight && state.sending.contains(field);
            if still_dirty {
                state.tracker.mark_dirty(field);
                state.touched_in_flight.insert(field.to_string());
            } else {
                state.touched_in_flight.remove(field);
            }
            (saved, still_dirty, !state.tracker.has_dirty())
        };
        self.inner.source.restore(field, &saved);
        self.inner.source.set_dirty_marker(field, still_dirty);
        debug!("Reverted {}", field);
        if clean {
            self.inner.status.set(SaveStatus::Saved);
        }
        true
    }

    // ── Pause / enable ───────────────────────────────────────────

    /// Suspends autosave. An in-flight save still completes.
    pub fn pause(&self) {
        self.inner.lock().paused = true;
        self.inner.scheduler.cancel();
    }

    /// Lifts a pause and saves right away if edits are pending.
    pub async fn resume(&self) {
        let pending = {
            let mut state = self.inner.lock();
            state.paused = false;
            state.tracker.has_dirty()
        };
        if pending && self.inner.preference.is_enabled() {
            self.save_changes().await;
        }
    }

    /// Turns autosave on or off and persists the choice.
    pub fn set_enabled(&self, enabled: bool) -> StorageResult<()> {
        if !enabled {
            self.inner.scheduler.cancel();
        }
        info!("Autosave {}", if enabled { "enabled" } else { "disabled" });
        self.inner.preference.set(enabled)
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn is_enabled(&self) -> bool {
        self.inner.preference.is_enabled()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    pub fn status(&self) -> SaveStatus {
        self.inner.status.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.inner.status.subscribe()
    }

    /// The message surfaced by the last failed save.
    pub fn last_error(&self) -> Option<String> {
        self.inner.status.last_error()
    }

    pub fn dirty_fields(&self) -> Vec<String> {
        self.inner.lock().tracker.dirty_fields()
    }

    pub fn is_dirty(&self, field: &str) -> bool {
        self.inner.lock().tracker.is_dirty(field)
    }

    /// The element as last saved.
    pub fn element(&self) -> Option<Element> {
        self.inner.lock().tracker.element().cloned()
    }

    pub fn snapshot(&self) -> Option<Element> {
        self.inner.lock().tracker.snapshot().cloned()
    }

    /// Whether a debounce timer is pending.
    pub fn has_pending_save(&self) -> bool {
        self.inner.scheduler.is_armed()
    }

    pub fn is_saving(&self) -> bool {
        self.inner.lock().in_flight
    }

    pub fn config(&self) -> &AutosaveConfig {
        &self.inner.config
    }

    // ── Timer ────────────────────────────────────────────────────

    pub(crate) fn arm(&self, generation: u64) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.scheduler.arm(async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let session = AutosaveSession { inner };
            let stale = session.inner.lock().generation != generation;
            if stale {
                return;
            }
            session.save_changes().await;
        });
    }
}
