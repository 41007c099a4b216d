//! Debounced autosave for the OnlyWorlds element editor.
//!
//! An [`AutosaveSession`] owns the element being edited and keeps it in step
//! with the backend:
//!
//! 1. **Track**: every edit marks its field dirty ([`FieldChangeTracker`])
//! 2. **Debounce**: a single timer is re-armed on each edit ([`DebounceScheduler`])
//! 3. **Save**: when the timer fires, dirty inputs are read from the
//!    [`FieldSource`], coerced per declared kind and sent in one update
//! 4. **Reconcile**: the canonical element is merged back, the snapshot
//!    retaken and the dirty set cleared
//! 5. **Report**: [`SaveStatus`] cycles `typing → saving → saved` (or `error`)
//!
//! Failed saves keep the dirty set so the next attempt retries them. A
//! field can be reverted to its snapshot value at any time.
//!
//! # Example
//!
//! ```
//! use owt_autosave::{AutosaveSession, MemoryFieldSource};
//! use owt_backend::{ElementBackend, LocalBackend};
//! use owt_model::Element;
//! use owt_storage::MemoryKvStore;
//! use serde_json::{Map, json};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let backend = Arc::new(LocalBackend::new(Arc::new(MemoryKvStore::new())));
//! let mut fields = Map::new();
//! fields.insert("name".into(), json!("Alice"));
//! let element = backend.create_element("character", &fields).await.unwrap();
//!
//! let source = Arc::new(MemoryFieldSource::from_element(&element, None));
//! let session = AutosaveSession::builder(backend, source.clone()).build();
//! session.begin_session(element);
//!
//! source.set_text("name", "Alicia");
//! session.on_field_changed("name");
//! session.save_changes().await;
//!
//! assert_eq!(session.element().unwrap().name(), Some("Alicia"));
//! # }
//! ```

mod executor;
mod field;
mod preference;
mod scheduler;
mod session;
mod status;
mod tracker;

pub use executor::failure_message;
pub use field::{
    FieldInput, FieldSource, MemoryFieldSource, RawInput, coerce, editable_input, infer_kind,
};
pub use preference::{AUTOSAVE_PREF_KEY, AutosavePreference};
pub use scheduler::DebounceScheduler;
pub use session::{
    AutosaveConfig, AutosaveSession, AutosaveSessionBuilder, DEFAULT_DEBOUNCE_MS, UpdateObserver,
};
pub use status::{SaveStatus, StatusReporter};
pub use tracker::FieldChangeTracker;
