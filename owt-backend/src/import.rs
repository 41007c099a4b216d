//! JSON world import.
//!
//! Accepts the export format `{ "<element type>": [ {element}, ... ], ... }`,
//! optionally wrapped in an `"elements"` object, and creates every element
//! through a backend.

use crate::backend::ElementBackend;
use crate::error::{BackendError, BackendResult};
use owt_model::is_known_element_type;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// One element that could not be imported.
#[derive(Debug, Clone, Serialize)]
pub struct ImportFailure {
    pub element_type: String,
    pub id: Option<String>,
    pub reason: String,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    /// Created element count per type.
    pub created: BTreeMap<String, usize>,
    /// Top-level keys that are not element collections.
    pub skipped_keys: Vec<String>,
    pub failures: Vec<ImportFailure>,
}

impl ImportSummary {
    pub fn total_created(&self) -> usize {
        self.created.values().sum()
    }
}

/// Imports a world export into `backend`.
///
/// Per-element failures are collected rather than aborting the import. Only
/// a payload that is not a JSON object at all is an error.
pub async fn import_world(
    backend: &dyn ElementBackend,
    world: &Value,
) -> BackendResult<ImportSummary> {
    let root = world
        .get("elements")
        .filter(|v| v.is_object())
        .unwrap_or(world);
    let Some(collections) = root.as_object() else {
        return Err(BackendError::Validation(
            "import payload must be a JSON object".into(),
        ));
    };

    let mut summary = ImportSummary::default();
    for (element_type, items) in collections {
        let (true, Some(items)) = (is_known_element_type(element_type), items.as_array()) else {
            warn!("Skipping import key {:?}", element_type);
            summary.skipped_keys.push(element_type.clone());
            continue;
        };

        for item in items {
            let id = item.get("id").and_then(Value::as_str).map(str::to_string);
            let result = match item.as_object() {
                Some(fields) => backend
                    .create_element(element_type, fields)
                    .await
                    .map(|_| ()),
                None => Err(BackendError::Validation("element is not an object".into())),
            };
            match result {
                Ok(()) => *summary.created.entry(element_type.clone()).or_default() += 1,
                Err(e) => {
                    warn!("Failed to import {} {:?}: {}", element_type, id, e);
                    summary.failures.push(ImportFailure {
                        element_type: element_type.clone(),
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    info!(
        "Imported {} elements into {} ({} failures)",
        summary.total_created(),
        backend.backend_name(),
        summary.failures.len()
    );
    Ok(summary)
}
