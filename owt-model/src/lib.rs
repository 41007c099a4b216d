//! Element model for the OnlyWorlds tool.
//!
//! Defines the types every other crate in the workspace depends on:
//! - [`Element`]: a world-building record (id, element type, JSON fields)
//! - [`FieldKind`]: the declared input type of a field, which drives coercion
//! - [`ElementSchema`]: the declared field kinds of one element type
//!
//! Relationship classification ([`is_relationship_field`]) lives here as well,
//! since both the backends and the autosave core need it.

mod element;
mod schema;

pub use element::Element;
pub use schema::{
    ELEMENT_TYPES, ElementSchema, FieldKind, is_known_element_type, is_relationship_field,
};

/// Result type alias using the crate's error type.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Errors that can occur when building model types from JSON.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("element is not a JSON object")]
    NotAnObject,

    #[error("element has no string id")]
    MissingId,
}
