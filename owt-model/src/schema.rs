use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Element types understood by the OnlyWorlds API.
pub const ELEMENT_TYPES: &[&str] = &[
    "ability",
    "character",
    "collective",
    "construct",
    "creature",
    "event",
    "family",
    "institution",
    "language",
    "law",
    "location",
    "map",
    "marker",
    "narrative",
    "object",
    "phenomenon",
    "pin",
    "relation",
    "species",
    "title",
    "trait",
    "zone",
];

/// Returns true if `element_type` is one of [`ELEMENT_TYPES`].
pub fn is_known_element_type(element_type: &str) -> bool {
    ELEMENT_TYPES.contains(&element_type)
}

/// Name-based relationship classification, used when a field has no
/// declared kind. Single links end in `_id`, link lists in `_ids`.
pub fn is_relationship_field(field: &str) -> bool {
    field.ends_with("_id") || field.ends_with("_ids")
}

/// The declared input type of a field.
///
/// Parsed leniently from the declared-type strings used by the editor forms;
/// anything unrecognised becomes [`FieldKind::Unknown`], which is coerced
/// like plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Bool,
    /// `array<string>`: free-form tags.
    StringList,
    /// Single reference to another element.
    Link,
    /// `array<id>`: references to other elements.
    LinkList,
    /// Structured JSON value.
    Object,
    Unknown,
}

impl FieldKind {
    /// Parses a declared-type string. Never fails.
    pub fn from_declared(declared: &str) -> Self {
        match declared.trim().to_ascii_lowercase().as_str() {
            "text" | "string" | "textarea" | "url" => Self::Text,
            "number" | "integer" | "int" | "float" => Self::Number,
            "boolean" | "bool" | "checkbox" => Self::Bool,
            "array<string>" | "tags" | "list" => Self::StringList,
            "link" | "single_link" => Self::Link,
            "array<id>" | "links" | "multi_link" => Self::LinkList,
            "object" | "json" => Self::Object,
            _ => Self::Unknown,
        }
    }

    pub fn is_relationship(self) -> bool {
        matches!(self, Self::Link | Self::LinkList)
    }

    pub fn is_list(self) -> bool {
        matches!(self, Self::StringList | Self::LinkList)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::StringList => "array<string>",
            Self::Link => "link",
            Self::LinkList => "array<id>",
            Self::Object => "object",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_declared(s))
    }
}

/// Declared field kinds for one element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSchema {
    pub element_type: String,
    pub fields: BTreeMap<String, FieldKind>,
}

impl ElementSchema {
    pub fn new(element_type: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Schema with the fields every OnlyWorlds element carries.
    pub fn base(element_type: impl Into<String>) -> Self {
        Self::new(element_type)
            .field("name", FieldKind::Text)
            .field("description", FieldKind::Text)
            .field("supertype", FieldKind::Text)
            .field("subtype", FieldKind::Text)
            .field("image_url", FieldKind::Text)
            .field("world", FieldKind::Link)
    }

    /// Builder-style field declaration.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    /// Declared kind of `field`, if any.
    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).copied()
    }

    /// Relationship classification: declared kind first, field name otherwise.
    pub fn is_relationship_field(&self, field: &str) -> bool {
        match self.kind_of(field) {
            Some(kind) => kind.is_relationship(),
            None => is_relationship_field(field),
        }
    }
}
