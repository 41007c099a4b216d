//! Field sources: the live, editable representation of each field.
//!
//! The autosave core never looks at a rendering surface. It reads raw input
//! through [`FieldSource`] and coerces it per the field's declared
//! [`FieldKind`] with [`coerce`].

use owt_model::{Element, ElementSchema, FieldKind, is_relationship_field};
use serde_json::{Number, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// Raw value of an input: a checkbox flag or free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    Flag(bool),
    Text(String),
}

impl RawInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// A field's declared kind together with its current raw input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInput {
    pub kind: FieldKind,
    pub raw: RawInput,
}

/// Read/write access to the editable inputs of the current element.
///
/// Implementations must not call back into the session that owns them.
pub trait FieldSource: Send + Sync {
    /// Current raw input of `field`, or `None` if the field has no input.
    fn read(&self, field: &str) -> Option<FieldInput>;

    /// Replaces the input of `field` with the editable form of `saved`.
    fn restore(&self, field: &str, saved: &Value);

    /// Shows or hides the unsaved-changes marker of `field`.
    fn set_dirty_marker(&self, field: &str, dirty: bool) {
        let _ = (field, dirty);
    }
}

/// Converts raw input into the value sent to the backend.
///
/// Never fails: malformed structured input falls back to the raw string.
pub fn coerce(kind: FieldKind, raw: &RawInput) -> Value {
    let text = match raw {
        RawInput::Flag(flag) if kind == FieldKind::Bool => return Value::Bool(*flag),
        RawInput::Flag(flag) => flag.to_string(),
        RawInput::Text(text) => text.clone(),
    };

    match kind {
        FieldKind::Bool => Value::Bool(matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "true" | "on" | "1" | "yes"
        )),
        FieldKind::Number => coerce_number(text.trim()),
        FieldKind::StringList | FieldKind::LinkList => Value::Array(
            text.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect(),
        ),
        FieldKind::Object => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        FieldKind::Text | FieldKind::Link | FieldKind::Unknown => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed.to_string())
            }
        }
    }
}

fn coerce_number(text: &str) -> Value {
    let Ok(n) = text.parse::<f64>() else {
        return Value::Null;
    };
    // Integral values go out as JSON integers, like the browser's JSON.stringify.
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Value::Null, Value::Number)
}

/// The editable form of a saved value.
pub fn editable_input(kind: FieldKind, saved: &Value) -> RawInput {
    if kind == FieldKind::Bool {
        return RawInput::Flag(saved.as_bool().unwrap_or(false));
    }
    let text = match saved {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string_pretty(saved).unwrap_or_default(),
        Value::Bool(_) | Value::Number(_) => saved.to_string(),
    };
    RawInput::Text(text)
}

/// Guesses a field's kind from its saved value and name.
pub fn infer_kind(field: &str, value: &Value) -> FieldKind {
    match value {
        Value::Bool(_) => FieldKind::Bool,
        Value::Number(_) => FieldKind::Number,
        Value::Object(_) => FieldKind::Object,
        Value::Array(_) if is_relationship_field(field) => FieldKind::LinkList,
        Value::Array(_) => FieldKind::StringList,
        _ if field.ends_with("_ids") => FieldKind::LinkList,
        _ if field.ends_with("_id") => FieldKind::Link,
        _ => FieldKind::Text,
    }
}

/// In-process [`FieldSource`], used headless and in tests.
#[derive(Debug, Default)]
pub struct MemoryFieldSource {
    inputs: Mutex<BTreeMap<String, FieldInput>>,
    marked: Mutex<BTreeSet<String>>,
}

impl MemoryFieldSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// One input per field of `element`, kinds taken from `schema` when declared.
    pub fn from_element(element: &Element, schema: Option<&ElementSchema>) -> Self {
        let source = Self::new();
        for (field, value) in &element.fields {
            let kind = schema
                .and_then(|s| s.kind_of(field))
                .unwrap_or_else(|| infer_kind(field, value));
            source.declare(field, kind);
            source.restore(field, value);
        }
        source
    }

    fn inputs(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, FieldInput>> {
        self.inputs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Declares an input with an empty value.
    pub fn declare(&self, field: &str, kind: FieldKind) {
        let raw = editable_input(kind, &Value::Null);
        self.inputs().insert(field.to_string(), FieldInput { kind, raw });
    }

    /// Types into a text input. Returns false if the field has no input.
    pub fn set_text(&self, field: &str, text: impl Into<String>) -> bool {
        self.set_raw(field, RawInput::Text(text.into()))
    }

    /// Toggles a checkbox input. Returns false if the field has no input.
    pub fn set_flag(&self, field: &str, flag: bool) -> bool {
        self.set_raw(field, RawInput::Flag(flag))
    }

    fn set_raw(&self, field: &str, raw: RawInput) -> bool {
        match self.inputs().get_mut(field) {
            Some(input) => {
                input.raw = raw;
                true
            }
            None => false,
        }
    }

    /// Removes the input of `field`. Returns whether it existed.
    pub fn remove(&self, field: &str) -> bool {
        self.inputs().remove(field).is_some()
    }

    pub fn raw(&self, field: &str) -> Option<RawInput> {
        self.inputs().get(field).map(|input| input.raw.clone())
    }

    pub fn is_marked(&self, field: &str) -> bool {
        self.marked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(field)
    }
}

impl FieldSource for MemoryFieldSource {
    fn read(&self, field: &str) -> Option<FieldInput> {
        self.inputs().get(field).cloned()
    }

    fn restore(&self, field: &str, saved: &Value) {
        if let Some(input) = self.inputs().get_mut(field) {
            input.raw = editable_input(input.kind, saved);
        }
    }

    fn set_dirty_marker(&self, field: &str, dirty: bool) {
        let mut marked = self.marked.lock().unwrap_or_else(|e| e.into_inner());
        if dirty {
            marked.insert(field.to_string());
        } else {
            marked.remove(field);
        }
    }
}
