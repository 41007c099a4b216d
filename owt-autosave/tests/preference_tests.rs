mod common;

use common::{Harness, wait_ms};
use owt_autosave::{AUTOSAVE_PREF_KEY, AutosavePreference};
use owt_storage::{KeyValueStore, MemoryKvStore, SqliteKvStore};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn missing_preference_means_enabled() {
    let store = Arc::new(MemoryKvStore::new());
    assert!(AutosavePreference::load(store).is_enabled());
}

#[test]
fn malformed_preference_means_enabled() {
    let store = Arc::new(MemoryKvStore::new());
    store.set(AUTOSAVE_PREF_KEY, "not json").unwrap();
    assert!(AutosavePreference::load(store).is_enabled());
}

#[test]
fn stored_false_is_respected() {
    let store = Arc::new(MemoryKvStore::new());
    store.set(AUTOSAVE_PREF_KEY, "false").unwrap();
    assert!(!AutosavePreference::load(store).is_enabled());
}

#[test]
fn set_writes_through() {
    let store = Arc::new(MemoryKvStore::new());
    let pref = AutosavePreference::load(store.clone());

    pref.set(false).unwrap();
    assert!(!pref.is_enabled());
    assert_eq!(store.get(AUTOSAVE_PREF_KEY).unwrap().as_deref(), Some("false"));

    pref.set(true).unwrap();
    assert_eq!(store.get(AUTOSAVE_PREF_KEY).unwrap().as_deref(), Some("true"));
}

#[test]
fn preference_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("owt.db");

    {
        let store = Arc::new(SqliteKvStore::open(&path).unwrap());
        AutosavePreference::load(store).set(false).unwrap();
    }

    let store = Arc::new(SqliteKvStore::open(&path).unwrap());
    assert!(!AutosavePreference::load(store).is_enabled());
}

#[tokio::test(start_paused = true)]
async fn session_set_enabled_persists() {
    let store = Arc::new(MemoryKvStore::new());
    let pref_store = store.clone();
    let h = Harness::with_session(move |b| {
        b.preference(AutosavePreference::load(pref_store)).build()
    });

    h.session.set_enabled(false).unwrap();
    assert!(!h.session.is_enabled());
    assert_eq!(store.get(AUTOSAVE_PREF_KEY).unwrap().as_deref(), Some("false"));

    h.edit("name", "Alice");
    wait_ms(5000).await;
    assert_eq!(h.backend.call_count(), 0);
}
