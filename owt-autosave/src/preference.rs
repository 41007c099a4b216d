//! The persisted "autosave enabled" preference.

use owt_storage::{KeyValueStore, StorageResult, get_json, set_json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Storage key of the preference.
pub const AUTOSAVE_PREF_KEY: &str = "owt.autosave.enabled";

/// Whether autosave is on, backed by a key-value store.
///
/// A missing or unreadable stored value means enabled.
pub struct AutosavePreference {
    enabled: AtomicBool,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl AutosavePreference {
    /// Loads the preference from `store`; later changes are written back.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let enabled = match get_json::<bool>(store.as_ref(), AUTOSAVE_PREF_KEY) {
            Ok(stored) => stored.unwrap_or(true),
            Err(e) => {
                warn!("Ignoring stored autosave preference: {}", e);
                true
            }
        };
        Self {
            enabled: AtomicBool::new(enabled),
            store: Some(store),
        }
    }

    /// A preference that is never persisted.
    pub fn in_memory(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            store: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Updates the preference. The in-memory value changes even when
    /// persisting fails.
    pub fn set(&self, enabled: bool) -> StorageResult<()> {
        self.enabled.store(enabled, Ordering::SeqCst);
        match &self.store {
            Some(store) => set_json(store.as_ref(), AUTOSAVE_PREF_KEY, &enabled),
            None => Ok(()),
        }
    }
}

impl Default for AutosavePreference {
    fn default() -> Self {
        Self::in_memory(true)
    }
}
