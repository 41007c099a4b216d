//! Dirty-field tracking against a snapshot of the last saved state.

use owt_model::Element;
use serde_json::Value;
use std::collections::BTreeSet;

/// The element being edited, its last saved snapshot and the dirty set.
///
/// The element itself only ever holds saved values; unsaved edits live in
/// the field source until a save merges the backend's canonical copy back.
#[derive(Debug, Default)]
pub struct FieldChangeTracker {
    element: Option<Element>,
    snapshot: Option<Element>,
    dirty: BTreeSet<String>,
}

impl FieldChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `element`, discarding any previous state.
    pub fn begin(&mut self, element: Element) {
        self.snapshot = Some(element.clone());
        self.element = Some(element);
        self.dirty.clear();
    }

    /// Drops all state.
    pub fn end(&mut self) {
        self.element = None;
        self.snapshot = None;
        self.dirty.clear();
    }

    pub fn is_active(&self) -> bool {
        self.element.is_some()
    }

    pub fn element(&self) -> Option<&Element> {
        self.element.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Element> {
        self.snapshot.as_ref()
    }

    /// Marks `field` dirty. Fields the element does not have are refused,
    /// so the dirty set stays a subset of the element's fields.
    pub fn mark_dirty(&mut self, field: &str) -> bool {
        match &self.element {
            Some(element) if element.has_field(field) => {
                self.dirty.insert(field.to_string());
                true
            }
            _ => false,
        }
    }

    pub fn is_dirty(&self, field: &str) -> bool {
        self.dirty.contains(field)
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn dirty_fields(&self) -> Vec<String> {
        self.dirty.iter().cloned().collect()
    }

    /// Drops `field` from the dirty set without touching its value.
    pub fn unmark(&mut self, field: &str) -> bool {
        self.dirty.remove(field)
    }

    /// Un-dirties `field` and returns its snapshot value.
    pub fn revert(&mut self, field: &str) -> Option<Value> {
        let saved = self.snapshot.as_ref()?.get(field)?.clone();
        self.dirty.remove(field);
        Some(saved)
    }

    /// Applies a successful bulk save: merges `canonical`, retakes the
    /// snapshot and clears the saved fields, except those in `keep_dirty`.
    pub fn apply_save(
        &mut self,
        canonical: &Element,
        saved_fields: &[String],
        keep_dirty: &BTreeSet<String>,
    ) {
        let Some(element) = self.element.as_mut() else {
            return;
        };
        element.merge(canonical);
        self.snapshot = Some(element.clone());
        for field in saved_fields {
            if !keep_dirty.contains(field) {
                self.dirty.remove(field);
            }
        }
    }

    /// Applies a single-field save. Snapshot and dirty set are untouched.
    pub fn apply_field_save(&mut self, canonical: &Element) {
        if let Some(element) = self.element.as_mut() {
            element.merge(canonical);
        }
    }
}
