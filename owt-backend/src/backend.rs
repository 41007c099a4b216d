//! Element backend abstraction trait.
//!
//! Defines a common interface for the remote API and the local clone.

use crate::error::BackendResult;
use async_trait::async_trait;
use owt_model::Element;
use serde_json::{Map, Value};

/// Abstract element CRUD interface.
#[async_trait]
pub trait ElementBackend: Send + Sync {
    /// Returns the name of the backend, for logs and status lines.
    fn backend_name(&self) -> &'static str;

    /// Fetches one element.
    async fn get_element(&self, element_type: &str, id: &str) -> BackendResult<Element>;

    /// Lists every element of a type.
    async fn list_elements(&self, element_type: &str) -> BackendResult<Vec<Element>>;

    /// Creates an element from its fields. An `id` field, when present, is kept.
    async fn create_element(
        &self,
        element_type: &str,
        fields: &Map<String, Value>,
    ) -> BackendResult<Element>;

    /// Applies a partial update and returns the canonical element.
    async fn update_element(
        &self,
        element_type: &str,
        id: &str,
        updates: &Map<String, Value>,
    ) -> BackendResult<Element>;

    /// Deletes an element.
    async fn delete_element(&self, element_type: &str, id: &str) -> BackendResult<()>;

    /// Whether `field` references other elements.
    fn is_relationship_field(&self, field: &str) -> bool {
        owt_model::is_relationship_field(field)
    }
}
