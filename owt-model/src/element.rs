use crate::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A world-building element (character, location, event, ...).
///
/// The wire form is a flat JSON object holding `id` plus every field. The
/// element type is not part of that object; it travels in the URL or the
/// storage key, so it is carried separately here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub element_type: String,
    /// Every field except `id`, in wire order.
    pub fields: Map<String, Value>,
}

impl Element {
    pub fn new(id: impl Into<String>, element_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Builds an element from its wire form.
    pub fn from_json(element_type: impl Into<String>, value: Value) -> ModelResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(ModelError::NotAnObject);
        };
        let id = match fields.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => return Err(ModelError::MissingId),
        };
        Ok(Self {
            id,
            element_type: element_type.into(),
            fields,
        })
    }

    /// Parses an element from a JSON string in wire form.
    pub fn from_json_str(element_type: impl Into<String>, json: &str) -> ModelResult<Self> {
        Self::from_json(element_type, serde_json::from_str(json)?)
    }

    /// Returns the wire form: the fields plus `id`.
    pub fn to_json(&self) -> Value {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        object.insert("id".into(), Value::String(self.id.clone()));
        for (name, value) in &self.fields {
            object.insert(name.clone(), value.clone());
        }
        Value::Object(object)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The element's display name, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    /// Merges a canonical copy returned by a backend into this element.
    ///
    /// Returned fields overwrite local ones; fields the backend did not
    /// return are kept. The id and type never change.
    pub fn merge(&mut self, canonical: &Element) {
        for (name, value) in &canonical.fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// Field names in wire order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}
