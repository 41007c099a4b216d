//! Element backends for the OnlyWorlds tool.
//!
//! The editor talks to one of two backends through the [`ElementBackend`]
//! trait:
//! - [`RemoteBackend`]: the OnlyWorlds world API over HTTPS
//! - [`LocalBackend`]: a clone of that API over a local key-value store
//!
//! [`ModeRouter`] holds both and forwards each call to whichever one the
//! current [`Mode`] selects. [`import_world`] loads a JSON world export
//! through any backend.
//!
//! # Example
//!
//! ```
//! use owt_backend::{ElementBackend, LocalBackend, Mode, ModeRouter};
//! use owt_storage::MemoryKvStore;
//! use std::sync::Arc;
//!
//! let local = Arc::new(LocalBackend::new(Arc::new(MemoryKvStore::new())));
//! let router = ModeRouter::new(local.clone(), local);
//! router.set_mode(Mode::Local).unwrap();
//! assert_eq!(router.backend_name(), "Local storage");
//! ```

mod backend;
mod error;
mod import;
mod local;
mod remote;
mod router;

pub use backend::ElementBackend;
pub use error::{BackendError, BackendResult};
pub use import::{ImportFailure, ImportSummary, import_world};
pub use local::{ELEMENT_KEY_PREFIX, LocalBackend};
pub use remote::{ApiConfig, RemoteBackend};
pub use router::{MODE_KEY, Mode, ModeRouter};
