use owt_model::{Element, ModelError};
use pretty_assertions::assert_eq;
use serde_json::json;

fn make_element() -> Element {
    Element::from_json(
        "character",
        json!({
            "id": "c-1",
            "name": "Alice",
            "tags": ["brave", "tall"],
            "ally_id": null,
            "stats": {"str": 10}
        }),
    )
    .unwrap()
}

// ── Wire form ────────────────────────────────────────────────────

#[test]
fn from_json_splits_id_from_fields() {
    let e = make_element();
    assert_eq!(e.id, "c-1");
    assert_eq!(e.element_type, "character");
    assert!(!e.has_field("id"));
    assert_eq!(e.get("name"), Some(&json!("Alice")));
}

#[test]
fn from_json_keeps_field_order() {
    let e = make_element();
    let names: Vec<&str> = e.field_names().collect();
    assert_eq!(names, vec!["name", "tags", "ally_id", "stats"]);
}

#[test]
fn from_json_rejects_non_object() {
    let err = Element::from_json("character", json!([1, 2])).unwrap_err();
    assert!(matches!(err, ModelError::NotAnObject));
}

#[test]
fn from_json_rejects_missing_id() {
    let err = Element::from_json("character", json!({"name": "x"})).unwrap_err();
    assert!(matches!(err, ModelError::MissingId));
}

#[test]
fn from_json_rejects_non_string_id() {
    let err = Element::from_json("character", json!({"id": 7})).unwrap_err();
    assert!(matches!(err, ModelError::MissingId));
}

#[test]
fn from_json_str_reports_parse_errors() {
    let err = Element::from_json_str("character", "{not json").unwrap_err();
    assert!(matches!(err, ModelError::Serialization(_)));
}

#[test]
fn to_json_puts_id_back() {
    let e = make_element();
    let wire = e.to_json();
    assert_eq!(wire["id"], "c-1");
    assert_eq!(wire["tags"], json!(["brave", "tall"]));
    let back = Element::from_json("character", wire).unwrap();
    assert_eq!(back, e);
}

#[test]
fn name_helper() {
    assert_eq!(make_element().name(), Some("Alice"));
    assert_eq!(Element::new("x", "location").name(), None);
}

// ── Merge ────────────────────────────────────────────────────────

#[test]
fn merge_overwrites_returned_fields_and_keeps_the_rest() {
    let mut e = make_element();
    let canonical = Element::new("c-1", "character")
        .with_field("name", json!("Alicia"))
        .with_field("ally_id", json!("c-2"));

    e.merge(&canonical);

    assert_eq!(e.get("name"), Some(&json!("Alicia")));
    assert_eq!(e.get("ally_id"), Some(&json!("c-2")));
    assert_eq!(e.get("tags"), Some(&json!(["brave", "tall"])));
    assert_eq!(e.get("stats"), Some(&json!({"str": 10})));
}

#[test]
fn merge_adds_new_fields() {
    let mut e = make_element();
    let canonical = Element::new("c-1", "character").with_field("updated_at", json!("2024"));
    e.merge(&canonical);
    assert!(e.has_field("updated_at"));
}

#[test]
fn clone_is_deep() {
    let e = make_element();
    let mut copy = e.clone();
    copy.fields
        .get_mut("tags")
        .and_then(|v| v.as_array_mut())
        .unwrap()
        .push(json!("new"));
    assert_eq!(e.get("tags"), Some(&json!(["brave", "tall"])));
}
