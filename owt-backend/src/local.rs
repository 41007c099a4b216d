//! Local clone of the world API, backed by a key-value store.
//!
//! Each element is stored in wire form under `owt.element.{type}.{id}`.

use crate::backend::ElementBackend;
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use owt_model::{Element, ElementSchema, FieldKind, is_known_element_type};
use owt_storage::KeyValueStore;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Key prefix for stored elements.
pub const ELEMENT_KEY_PREFIX: &str = "owt.element.";

fn element_key(element_type: &str, id: &str) -> String {
    format!("{ELEMENT_KEY_PREFIX}{element_type}.{id}")
}

fn type_prefix(element_type: &str) -> String {
    format!("{ELEMENT_KEY_PREFIX}{element_type}.")
}

/// Element backend over a local key-value store.
pub struct LocalBackend {
    store: Arc<dyn KeyValueStore>,
    schemas: HashMap<String, ElementSchema>,
}

impl LocalBackend {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            schemas: HashMap::new(),
        }
    }

    /// Registers a schema used for relationship validation.
    pub fn with_schema(mut self, schema: ElementSchema) -> Self {
        self.schemas.insert(schema.element_type.clone(), schema);
        self
    }

    fn check_type(element_type: &str) -> BackendResult<()> {
        if is_known_element_type(element_type) {
            Ok(())
        } else {
            Err(BackendError::UnknownElementType(element_type.to_string()))
        }
    }

    /// Relationship kind of a field, from the schema or the field name.
    fn relationship_kind(&self, element_type: &str, field: &str) -> Option<FieldKind> {
        if let Some(kind) = self.schemas.get(element_type).and_then(|s| s.kind_of(field)) {
            return kind.is_relationship().then_some(kind);
        }
        if field.ends_with("_ids") {
            Some(FieldKind::LinkList)
        } else if field.ends_with("_id") {
            Some(FieldKind::Link)
        } else {
            None
        }
    }

    /// Rejects malformed relationship references, as the remote API does.
    fn validate(&self, element_type: &str, fields: &Map<String, Value>) -> BackendResult<()> {
        for (field, value) in fields {
            let well_formed = match self.relationship_kind(element_type, field) {
                Some(FieldKind::Link) => matches!(value, Value::Null | Value::String(_)),
                Some(_) => match value {
                    Value::Null => true,
                    Value::Array(items) => items.iter().all(Value::is_string),
                    _ => false,
                },
                None => true,
            };
            if !well_formed {
                return Err(BackendError::Validation(format!(
                    "{field}: invalid reference {value}"
                )));
            }
        }
        Ok(())
    }

    fn load(&self, element_type: &str, id: &str) -> BackendResult<Element> {
        match self.store.get(&element_key(element_type, id))? {
            Some(raw) => Ok(Element::from_json_str(element_type, &raw)?),
            None => Err(BackendError::NotFound {
                element_type: element_type.to_string(),
                id: id.to_string(),
            }),
        }
    }

    fn store_element(&self, element: &Element) -> BackendResult<()> {
        let raw = serde_json::to_string(&element.to_json())?;
        self.store
            .set(&element_key(&element.element_type, &element.id), &raw)?;
        Ok(())
    }
}

#[async_trait]
impl ElementBackend for LocalBackend {
    fn backend_name(&self) -> &'static str {
        "Local storage"
    }

    async fn get_element(&self, element_type: &str, id: &str) -> BackendResult<Element> {
        Self::check_type(element_type)?;
        self.load(element_type, id)
    }

    async fn list_elements(&self, element_type: &str) -> BackendResult<Vec<Element>> {
        Self::check_type(element_type)?;
        let prefix = type_prefix(element_type);
        let mut elements = Vec::new();
        for key in self.store.keys_with_prefix(&prefix)? {
            if let Some(raw) = self.store.get(&key)? {
                elements.push(Element::from_json_str(element_type, &raw)?);
            }
        }
        Ok(elements)
    }

    async fn create_element(
        &self,
        element_type: &str,
        fields: &Map<String, Value>,
    ) -> BackendResult<Element> {
        Self::check_type(element_type)?;
        self.validate(element_type, fields)?;

        let mut wire = fields.clone();
        let id = match wire.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            _ => Uuid::now_v7().to_string(),
        };
        if self.store.get(&element_key(element_type, &id))?.is_some() {
            return Err(BackendError::Validation(format!(
                "{element_type} {id} already exists"
            )));
        }
        wire.insert("id".into(), Value::String(id));

        let element = Element::from_json(element_type, Value::Object(wire))?;
        self.store_element(&element)?;
        info!("Created local {} {}", element_type, element.id);
        Ok(element)
    }

    async fn update_element(
        &self,
        element_type: &str,
        id: &str,
        updates: &Map<String, Value>,
    ) -> BackendResult<Element> {
        Self::check_type(element_type)?;
        if updates.contains_key("id") {
            return Err(BackendError::Validation("id cannot be changed".into()));
        }
        self.validate(element_type, updates)?;

        let mut element = self.load(element_type, id)?;
        for (field, value) in updates {
            element.fields.insert(field.clone(), value.clone());
        }
        self.store_element(&element)?;
        debug!("Updated local {element_type} {id} ({} fields)", updates.len());
        Ok(element)
    }

    async fn delete_element(&self, element_type: &str, id: &str) -> BackendResult<()> {
        Self::check_type(element_type)?;
        if !self.store.remove(&element_key(element_type, id))? {
            return Err(BackendError::NotFound {
                element_type: element_type.to_string(),
                id: id.to_string(),
            });
        }
        info!("Deleted local {element_type} {id}");
        Ok(())
    }

    fn is_relationship_field(&self, field: &str) -> bool {
        self.schemas
            .values()
            .find_map(|schema| schema.kind_of(field))
            .map_or_else(
                || owt_model::is_relationship_field(field),
                FieldKind::is_relationship,
            )
    }
}
