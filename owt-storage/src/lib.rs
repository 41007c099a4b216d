//! Durable key-value storage for the OnlyWorlds tool.
//!
//! The editor keeps everything it persists on the client (the local element
//! clone, the autosave preference, the backend mode) in a flat string
//! key-value store, keyed by dotted namespaces such as `owt.autosave.enabled`.
//!
//! - [`SqliteKvStore`] persists to a SQLite file (or memory, for tests)
//! - [`MemoryKvStore`] is a plain in-process map
//!
//! Both implement [`KeyValueStore`], which the rest of the workspace takes
//! as `Arc<dyn KeyValueStore>`.

mod error;
mod memory;
mod sqlite;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes `key`. Returns whether it existed.
    fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Returns all keys starting with `prefix`, sorted.
    fn keys_with_prefix(&self, prefix: &str) -> StorageResult<Vec<String>>;
}

/// Reads and deserializes a JSON value stored under `key`.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> StorageResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serializes `value` as JSON and stores it under `key`.
pub fn set_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    store.set(key, &serde_json::to_string(value)?)
}
