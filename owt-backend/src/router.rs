//! Mode router: sends every call to the remote API or the local store.

use crate::backend::ElementBackend;
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use owt_model::Element;
use owt_storage::{KeyValueStore, get_json, set_json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Storage key for the persisted mode.
pub const MODE_KEY: &str = "owt.mode";

/// Which backend is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Online,
    Local,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => f.write_str("online"),
            Self::Local => f.write_str("local"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "online" | "remote" | "api" => Ok(Self::Online),
            "local" | "offline" => Ok(Self::Local),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Routes element operations to the backend selected by the current [`Mode`].
pub struct ModeRouter {
    remote: Arc<dyn ElementBackend>,
    local: Arc<dyn ElementBackend>,
    mode: RwLock<Mode>,
    prefs: Option<Arc<dyn KeyValueStore>>,
}

impl ModeRouter {
    /// Creates a router in [`Mode::Online`] that does not persist its mode.
    pub fn new(remote: Arc<dyn ElementBackend>, local: Arc<dyn ElementBackend>) -> Self {
        Self {
            remote,
            local,
            mode: RwLock::new(Mode::default()),
            prefs: None,
        }
    }

    /// Creates a router whose mode is loaded from and saved to `prefs`.
    ///
    /// A missing or unreadable stored mode falls back to [`Mode::Online`].
    pub fn with_persistence(
        remote: Arc<dyn ElementBackend>,
        local: Arc<dyn ElementBackend>,
        prefs: Arc<dyn KeyValueStore>,
    ) -> Self {
        let mode = match get_json::<Mode>(prefs.as_ref(), MODE_KEY) {
            Ok(mode) => mode.unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring stored mode: {}", e);
                Mode::default()
            }
        };
        Self {
            remote,
            local,
            mode: RwLock::new(mode),
            prefs: Some(prefs),
        }
    }

    pub fn mode(&self) -> Mode {
        *self.mode.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Switches mode, persisting it when the router has a preference store.
    pub fn set_mode(&self, mode: Mode) -> BackendResult<()> {
        *self.mode.write().unwrap_or_else(|e| e.into_inner()) = mode;
        info!("Backend mode set to {}", mode);
        if let Some(prefs) = &self.prefs {
            set_json(prefs.as_ref(), MODE_KEY, &mode).map_err(BackendError::from)?;
        }
        Ok(())
    }

    /// The backend for the current mode.
    pub fn active(&self) -> &Arc<dyn ElementBackend> {
        match self.mode() {
            Mode::Online => &self.remote,
            Mode::Local => &self.local,
        }
    }
}

#[async_trait]
impl ElementBackend for ModeRouter {
    fn backend_name(&self) -> &'static str {
        self.active().backend_name()
    }

    async fn get_element(&self, element_type: &str, id: &str) -> BackendResult<Element> {
        self.active().get_element(element_type, id).await
    }

    async fn list_elements(&self, element_type: &str) -> BackendResult<Vec<Element>> {
        self.active().list_elements(element_type).await
    }

    async fn create_element(
        &self,
        element_type: &str,
        fields: &Map<String, Value>,
    ) -> BackendResult<Element> {
        self.active().create_element(element_type, fields).await
    }

    async fn update_element(
        &self,
        element_type: &str,
        id: &str,
        updates: &Map<String, Value>,
    ) -> BackendResult<Element> {
        self.active().update_element(element_type, id, updates).await
    }

    async fn delete_element(&self, element_type: &str, id: &str) -> BackendResult<()> {
        self.active().delete_element(element_type, id).await
    }

    fn is_relationship_field(&self, field: &str) -> bool {
        self.active().is_relationship_field(field)
    }
}
