use owt_backend::{BackendError, ElementBackend, LocalBackend};
use owt_model::{ElementSchema, FieldKind};
use owt_storage::{KeyValueStore, MemoryKvStore};
use serde_json::{Map, Value, json};
use std::sync::Arc;

fn make_backend() -> (LocalBackend, Arc<MemoryKvStore>) {
    let store = Arc::new(MemoryKvStore::new());
    let backend = LocalBackend::new(store.clone())
        .with_schema(ElementSchema::base("character").field("allies", FieldKind::LinkList));
    (backend, store)
}

fn fields(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

async fn seed(backend: &LocalBackend) {
    backend
        .create_element(
            "character",
            &fields(json!({"id": "c-1", "name": "Alice", "ally_id": null, "tags": []})),
        )
        .await
        .unwrap();
}

// ── Create / get / list ─────────────────────────────────────────

#[tokio::test]
async fn create_keeps_given_id_and_stores_wire_form() {
    let (backend, store) = make_backend();
    seed(&backend).await;

    let raw = store.get("owt.element.character.c-1").unwrap().unwrap();
    let wire: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(wire["id"], "c-1");
    assert_eq!(wire["name"], "Alice");
}

#[tokio::test]
async fn create_generates_id_when_absent() {
    let (backend, _) = make_backend();
    let element = backend
        .create_element("location", &fields(json!({"name": "Harbor"})))
        .await
        .unwrap();
    assert!(uuid::Uuid::parse_str(&element.id).is_ok());
    assert_eq!(element.name(), Some("Harbor"));
}

#[tokio::test]
async fn create_rejects_duplicate_id() {
    let (backend, _) = make_backend();
    seed(&backend).await;
    let err = backend
        .create_element("character", &fields(json!({"id": "c-1"})))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Validation(_)));
}

#[tokio::test]
async fn get_returns_stored_element() {
    let (backend, _) = make_backend();
    seed(&backend).await;
    let element = backend.get_element("character", "c-1").await.unwrap();
    assert_eq!(element.name(), Some("Alice"));
}

#[tokio::test]
async fn get_missing_is_not_found() {
    let (backend, _) = make_backend();
    let err = backend.get_element("character", "nope").await.unwrap_err();
    assert!(matches!(err, BackendError::NotFound { .. }));
}

#[tokio::test]
async fn list_is_scoped_to_type() {
    let (backend, _) = make_backend();
    seed(&backend).await;
    backend
        .create_element("location", &fields(json!({"id": "l-1"})))
        .await
        .unwrap();

    let characters = backend.list_elements("character").await.unwrap();
    assert_eq!(characters.len(), 1);
    assert_eq!(characters[0].id, "c-1");
}

#[tokio::test]
async fn unknown_type_is_rejected() {
    let (backend, _) = make_backend();
    let err = backend.list_elements("spaceship").await.unwrap_err();
    assert!(matches!(err, BackendError::UnknownElementType(t) if t == "spaceship"));
}

// ── Update ──────────────────────────────────────────────────────

#[tokio::test]
async fn update_merges_and_returns_canonical() {
    let (backend, _) = make_backend();
    seed(&backend).await;

    let updated = backend
        .update_element("character", "c-1", &fields(json!({"name": "Alicia"})))
        .await
        .unwrap();
    assert_eq!(updated.name(), Some("Alicia"));
    assert_eq!(updated.get("tags"), Some(&json!([])));

    let reloaded = backend.get_element("character", "c-1").await.unwrap();
    assert_eq!(reloaded, updated);
}

#[tokio::test]
async fn update_missing_is_not_found() {
    let (backend, _) = make_backend();
    let err = backend
        .update_element("character", "ghost", &fields(json!({"name": "x"})))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::NotFound { .. }));
}

#[tokio::test]
async fn update_rejects_id_change() {
    let (backend, _) = make_backend();
    seed(&backend).await;
    let err = backend
        .update_element("character", "c-1", &fields(json!({"id": "c-2"})))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Validation(_)));
}

#[tokio::test]
async fn malformed_single_link_is_rejected() {
    let (backend, _) = make_backend();
    seed(&backend).await;
    let err = backend
        .update_element("character", "c-1", &fields(json!({"ally_id": ["a", "b"]})))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Validation(msg) if msg.contains("ally_id")));
}

#[tokio::test]
async fn malformed_link_list_is_rejected() {
    let (backend, _) = make_backend();
    seed(&backend).await;
    let err = backend
        .update_element("character", "c-1", &fields(json!({"allies": "c-2"})))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Validation(_)));

    backend
        .update_element("character", "c-1", &fields(json!({"allies": ["c-2", "c-3"]})))
        .await
        .unwrap();
}

// ── Delete / classification ─────────────────────────────────────

#[tokio::test]
async fn delete_removes_element() {
    let (backend, _) = make_backend();
    seed(&backend).await;
    backend.delete_element("character", "c-1").await.unwrap();
    let err = backend.delete_element("character", "c-1").await.unwrap_err();
    assert!(matches!(err, BackendError::NotFound { .. }));
}

#[test]
fn relationship_classification_uses_schema() {
    let (backend, _) = make_backend();
    assert!(backend.is_relationship_field("allies"));
    assert!(backend.is_relationship_field("ally_id"));
    assert!(backend.is_relationship_field("world"));
    assert!(!backend.is_relationship_field("name"));
}
