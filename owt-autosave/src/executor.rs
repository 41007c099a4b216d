//! Save paths: debounced bulk save and immediate single-field save.

use crate::field::coerce;
use crate::session::{AutosaveSession, Inner};
use crate::status::SaveStatus;
use owt_backend::BackendError;
use owt_model::Element;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Everything a bulk save needs once the session lock is released.
struct BulkSave {
    generation: u64,
    element_type: String,
    id: String,
    fields: Vec<String>,
    relationship_fields: Vec<String>,
    updates: Map<String, Value>,
}

/// Clears the in-flight flag on every exit path, cancellation included.
struct InFlightGuard<'a> {
    inner: &'a Inner,
    generation: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        if state.generation == self.generation {
            state.in_flight = false;
            state.sending.clear();
            state.touched_in_flight.clear();
        }
    }
}

/// User-facing message for a failed save of `fields`.
pub fn failure_message(
    fields: &[String],
    relationship_fields: &[String],
    error: &BackendError,
) -> String {
    let mut message = format!("Failed to save {}: {}", fields.join(", "), error);
    if !relationship_fields.is_empty() {
        message.push_str(&format!(
            "\n\n{} link to other elements. Check that every referenced element exists \
             in this world and that the value is an element id (a comma-separated list \
             of ids for multi-links), not a name.",
            relationship_fields.join(", ")
        ));
    }
    message
}

impl AutosaveSession {
    fn is_relationship(&self, field: &str) -> bool {
        self.inner.backend.is_relationship_field(field)
            || self
                .inner
                .source
                .read(field)
                .is_some_and(|input| input.kind.is_relationship())
    }

    /// Saves one field immediately, bypassing the debounce.
    ///
    /// Dirty set and snapshot are left alone. Returns whether the save
    /// succeeded.
    pub async fn save_field(&self, field: &str, value: Value) -> bool {
        let (generation, element_type, id) = {
            let state = self.inner.lock();
            let Some(element) = state.tracker.element() else {
                warn!("save_field({:?}) without an active session", field);
                return false;
            };
            (state.generation, element.element_type.clone(), element.id.clone())
        };

        self.inner.status.set(SaveStatus::Saving);
        let mut updates = Map::new();
        updates.insert(field.to_string(), value);

        match self
            .inner
            .backend
            .update_element(&element_type, &id, &updates)
            .await
        {
            Ok(canonical) => {
                let merged = {
                    let mut state = self.inner.lock();
                    if state.generation != generation {
                        debug!("Dropping save_field result for a replaced session");
                        return true;
                    }
                    state.tracker.apply_field_save(&canonical);
                    state.tracker.element().cloned()
                };
                if let Some(element) = merged {
                    self.notify(&element);
                }
                self.inner.status.set(SaveStatus::Saved);
                info!("Saved {} on {} {}", field, element_type, id);
                true
            }
            Err(e) => {
                if self.inner.lock().generation != generation {
                    debug!("Dropping save_field error for a replaced session: {}", e);
                    return false;
                }
                let fields = [field.to_string()];
                let relationship: &[String] = if self.is_relationship(field) {
                    &fields
                } else {
                    &[]
                };
                let message = failure_message(&fields, relationship, &e);
                warn!("{}", message);
                self.inner.status.fail(message);
                false
            }
        }
    }

    /// Saves every dirty field in one backend call.
    ///
    /// A silent no-op while another bulk save is in flight, when nothing is
    /// dirty, or when autosave is disabled or paused.
    pub async fn save_changes(&self) {
        let Some(job) = self.prepare_bulk_save() else {
            return;
        };
        let _guard = InFlightGuard {
            inner: self.inner.as_ref(),
            generation: job.generation,
        };

        self.inner.status.set(SaveStatus::Saving);
        debug!("Saving {} on {} {}", job.fields.join(", "), job.element_type, job.id);

        let result = self
            .inner
            .backend
            .update_element(&job.element_type, &job.id, &job.updates)
            .await;

        match result {
            Ok(canonical) => self.finish_bulk_save(&job, &canonical),
            Err(e) => {
                if self.inner.lock().generation != job.generation {
                    debug!("Dropping save error for a replaced session: {}", e);
                    return;
                }
                let message = failure_message(&job.fields, &job.relationship_fields, &e);
                warn!("{}", message);
                self.inner.status.fail(message);
            }
        }
    }

    /// Checks the guards, claims the in-flight flag and collects the
    /// coerced value of every dirty field.
    fn prepare_bulk_save(&self) -> Option<BulkSave> {
        if !self.inner.preference.is_enabled() {
            return None;
        }
        let (generation, element_type, id, dirty) = {
            let mut state = self.inner.lock();
            if state.in_flight || state.paused || !state.tracker.has_dirty() {
                return None;
            }
            let element = state.tracker.element()?;
            let claimed = (
                state.generation,
                element.element_type.clone(),
                element.id.clone(),
                state.tracker.dirty_fields(),
            );
            state.in_flight = true;
            state.sending = claimed.3.iter().cloned().collect();
            state.touched_in_flight.clear();
            claimed
        };

        let mut fields = Vec::with_capacity(dirty.len());
        let mut relationship_fields = Vec::new();
        let mut updates = Map::new();
        let mut missing = Vec::new();
        for field in dirty {
            let Some(input) = self.inner.source.read(&field) else {
                warn!("No input for dirty field {:?}, dropping it", field);
                missing.push(field);
                continue;
            };
            if input.kind.is_relationship() || self.inner.backend.is_relationship_field(&field) {
                relationship_fields.push(field.clone());
            }
            updates.insert(field.clone(), coerce(input.kind, &input.raw));
            fields.push(field);
        }

        if !missing.is_empty() {
            let clean = {
                let mut state = self.inner.lock();
                if state.generation != generation {
                    return None;
                }
                for field in &missing {
                    state.tracker.unmark(field);
                    state.sending.remove(field);
                    state.touched_in_flight.remove(field);
                }
                if updates.is_empty() {
                    state.in_flight = false;
                    state.sending.clear();
                }
                !state.tracker.has_dirty()
            };
            for field in &missing {
                self.inner.source.set_dirty_marker(field, false);
            }
            if updates.is_empty() {
                if clean {
                    self.inner.status.set(SaveStatus::Saved);
                }
                return None;
            }
        }

        Some(BulkSave {
            generation,
            element_type,
            id,
            fields,
            relationship_fields,
            updates,
        })
    }

    /// Applies a successful bulk save in one critical section.
    fn finish_bulk_save(&self, job: &BulkSave, canonical: &Element) {
        let (element, cleared, remaining) = {
            let mut state = self.inner.lock();
            if state.generation != job.generation {
                debug!("Dropping save result for a replaced session");
                return;
            }
            let keep = std::mem::take(&mut state.touched_in_flight);
            state.tracker.apply_save(canonical, &job.fields, &keep);
            let cleared: Vec<&String> = job
                .fields
                .iter()
                .filter(|f| !state.tracker.is_dirty(f))
                .collect();
            (
                state.tracker.element().cloned(),
                cleared,
                state.tracker.has_dirty(),
            )
        };

        for field in cleared {
            self.inner.source.set_dirty_marker(field, false);
        }
        info!("Saved {} fields on {} {}", job.fields.len(), job.element_type, job.id);

        if remaining {
            // Edited while the save was in flight: next debounce cycle.
            self.inner.status.set(SaveStatus::Typing);
            self.arm(job.generation);
        } else {
            self.inner.status.set(SaveStatus::Saved);
        }
        if let Some(element) = element {
            self.notify(&element);
        }
    }

    fn notify(&self, element: &Element) {
        if let Some(observer) = &self.inner.observer {
            observer.element_updated(element);
        }
    }
}
