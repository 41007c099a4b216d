//! Shared test helpers for autosave tests.

#![allow(dead_code)]

use async_trait::async_trait;
use owt_autosave::{AutosaveSession, MemoryFieldSource};
use owt_backend::{BackendError, BackendResult, ElementBackend};
use owt_model::{Element, ElementSchema, FieldKind};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// In-memory backend that records every update call.
#[derive(Default)]
pub struct MockBackend {
    elements: Mutex<HashMap<(String, String), Element>>,
    calls: Mutex<Vec<Map<String, Value>>>,
    fail_with: Mutex<Option<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockBackend {
    pub fn with_element(element: Element) -> Self {
        let backend = Self::default();
        backend.elements.lock().unwrap().insert(
            (element.element_type.clone(), element.id.clone()),
            element,
        );
        backend
    }

    /// Update payloads received so far.
    pub fn calls(&self) -> Vec<Map<String, Value>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Makes every following update fail with a validation error.
    pub fn fail(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn succeed(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    /// Holds the next update call until the returned `Notify` is signalled.
    pub fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl ElementBackend for MockBackend {
    fn backend_name(&self) -> &'static str {
        "Mock"
    }

    async fn get_element(&self, element_type: &str, id: &str) -> BackendResult<Element> {
        self.elements
            .lock()
            .unwrap()
            .get(&(element_type.to_string(), id.to_string()))
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                element_type: element_type.to_string(),
                id: id.to_string(),
            })
    }

    async fn list_elements(&self, element_type: &str) -> BackendResult<Vec<Element>> {
        Ok(self
            .elements
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.element_type == element_type)
            .cloned()
            .collect())
    }

    async fn create_element(
        &self,
        _element_type: &str,
        _fields: &Map<String, Value>,
    ) -> BackendResult<Element> {
        Err(BackendError::Validation("not supported".into()))
    }

    async fn update_element(
        &self,
        element_type: &str,
        id: &str,
        updates: &Map<String, Value>,
    ) -> BackendResult<Element> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(updates.clone());
            calls.len()
        };

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(BackendError::Validation(message));
        }

        let mut elements = self.elements.lock().unwrap();
        let element = elements
            .get_mut(&(element_type.to_string(), id.to_string()))
            .ok_or_else(|| BackendError::NotFound {
                element_type: element_type.to_string(),
                id: id.to_string(),
            })?;
        for (field, value) in updates {
            element.fields.insert(field.clone(), value.clone());
        }
        element
            .fields
            .insert("revision".into(), json!(call_number));
        Ok(element.clone())
    }

    async fn delete_element(&self, _element_type: &str, _id: &str) -> BackendResult<()> {
        Ok(())
    }
}

pub fn character_schema() -> ElementSchema {
    ElementSchema::base("character")
        .field("tags", FieldKind::StringList)
        .field("ally_id", FieldKind::Link)
        .field("alive", FieldKind::Bool)
        .field("age", FieldKind::Number)
        .field("stats", FieldKind::Object)
}

pub fn character() -> Element {
    Element::new("c-1", "character")
        .with_field("name", json!("Bob"))
        .with_field("tags", json!(["x"]))
        .with_field("ally_id", Value::Null)
        .with_field("alive", json!(true))
        .with_field("age", json!(30))
        .with_field("stats", json!({"str": 1}))
}

pub struct Harness {
    pub session: AutosaveSession,
    pub backend: Arc<MockBackend>,
    pub source: Arc<MemoryFieldSource>,
}

impl Harness {
    /// A session editing [`character`] with default config.
    pub fn new() -> Self {
        Self::with_session(|builder| builder.build())
    }

    pub fn with_session(
        build: impl FnOnce(owt_autosave::AutosaveSessionBuilder) -> AutosaveSession,
    ) -> Self {
        let element = character();
        let backend = Arc::new(MockBackend::with_element(element.clone()));
        let source = Arc::new(MemoryFieldSource::from_element(
            &element,
            Some(&character_schema()),
        ));
        let session = build(AutosaveSession::builder(backend.clone(), source.clone()));
        session.begin_session(element);
        Self {
            session,
            backend,
            source,
        }
    }

    /// Types `text` into `field` and reports the change.
    pub fn edit(&self, field: &str, text: &str) {
        assert!(self.source.set_text(field, text), "no input for {field}");
        self.session.on_field_changed(field);
    }
}

/// Sleeps on the (paused) test clock.
pub async fn wait_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
