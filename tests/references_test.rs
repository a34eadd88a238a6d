//! Tests for `$ref` resolution through the document index.

use schemata::{Document, EvaluationError, JsonPointer, SchemaNode, ValidationFailure, ValidationResult, Validator, Value};
use serde_json::json;
use stillwater::Validation;

fn doc(schema: serde_json::Value) -> Document {
    Document::from_json(&schema.into()).expect("valid schema")
}

fn unwrap_failure(result: ValidationResult<()>) -> ValidationFailure {
    match result {
        Validation::Failure(f) => f,
        Validation::Success(_) => panic!("Expected failure"),
    }
}

fn valid(doc: &Document, value: serde_json::Value) -> bool {
    doc.is_valid(&Value::from(value)).unwrap()
}

#[test]
fn test_defs_reference() {
    let schema = doc(json!({
        "$defs": {"PositiveInt": {"type": "integer", "exclusiveMinimum": 0}},
        "type": "object",
        "properties": {"count": {"$ref": "#/$defs/PositiveInt"}}
    }));

    assert!(valid(&schema, json!({"count": 3})));

    let failure = unwrap_failure(schema.validate(&json!({"count": 0}).into()).unwrap());
    let error = failure.first();
    // errors carry the target's location and the instance location of the ref site
    assert_eq!(error.schema_path.to_string(), "#/$defs/PositiveInt");
    assert_eq!(error.instance_path.to_string(), "#/count");
}

#[test]
fn test_ref_with_sibling_keywords() {
    let schema = doc(json!({
        "$defs": {"Str": {"type": "string"}},
        "$ref": "#/$defs/Str",
        "maxLength": 3
    }));

    assert!(valid(&schema, json!("abc")));
    assert!(!valid(&schema, json!("abcd")));
    assert!(!valid(&schema, json!(1)));
}

#[test]
fn test_root_reference() {
    let schema = doc(json!({
        "type": "object",
        "properties": {"child": {"$ref": "#"}},
        "additionalProperties": false
    }));

    assert!(valid(&schema, json!({"child": {"child": {}}})));
    assert!(!valid(&schema, json!({"child": {"other": 1}})));
}

#[test]
fn test_escaped_pointer_segments() {
    let schema = doc(json!({
        "$defs": {
            "a/b": {"type": "integer"},
            "c%d": {"type": "string"},
            "t~": {"type": "boolean"}
        },
        "properties": {
            "slash": {"$ref": "#/$defs/a~1b"},
            "percent": {"$ref": "#/$defs/c%25d"},
            "tilde": {"$ref": "#/$defs/t~0"}
        }
    }));

    assert!(valid(&schema, json!({"slash": 1, "percent": "x", "tilde": true})));
    assert!(!valid(&schema, json!({"slash": "1"})));
    assert!(!valid(&schema, json!({"percent": 1})));
    assert!(!valid(&schema, json!({"tilde": 1})));
}

#[test]
fn test_anchor_reference() {
    let schema = doc(json!({
        "$defs": {"name": {"$anchor": "name", "type": "string", "minLength": 1}},
        "properties": {"first": {"$ref": "#name"}}
    }));

    assert!(valid(&schema, json!({"first": "Ada"})));
    assert!(!valid(&schema, json!({"first": ""})));
}

#[test]
fn test_embedded_resource_by_id() {
    let schema = doc(json!({
        "$id": "https://example.com/root.json",
        "$defs": {
            "A": {
                "$id": "item.json",
                "type": "integer"
            }
        },
        "properties": {
            "by_id": {"$ref": "item.json"},
            "by_url": {"$ref": "https://example.com/item.json"},
            "by_pointer": {"$ref": "#/$defs/A"}
        }
    }));

    assert!(valid(&schema, json!({"by_id": 1, "by_url": 2, "by_pointer": 3})));
    assert!(!valid(&schema, json!({"by_id": "x"})));
    assert!(!valid(&schema, json!({"by_url": "x"})));
    assert!(!valid(&schema, json!({"by_pointer": "x"})));
}

#[test]
fn test_unresolvable_reference_is_fatal() {
    let schema = doc(json!({"properties": {"a": {"$ref": "#/$defs/missing"}}}));

    // a value that never reaches the ref validates
    assert!(valid(&schema, json!({})));

    match schema.validate(&json!({"a": 1}).into()) {
        Err(EvaluationError::UnresolvableReference { reference, location }) => {
            assert_eq!(reference, "#/$defs/missing");
            assert_eq!(location.to_string(), "#/properties/a");
        }
        other => panic!("expected unresolvable reference, got {:?}", other),
    }
}

#[test]
fn test_external_reference_is_not_yet_implemented() {
    let schema = doc(json!({"$ref": "https://example.com/other.json"}));
    let err = schema.validate(&json!(1).into()).unwrap_err();
    assert!(err.is_not_yet_implemented());
}

#[test]
fn test_external_reference_is_listed_and_not_fetched() {
    let schema = doc(json!({
        "properties": {"other": {"$ref": "https://example.com/other.json#/$defs/a"}}
    }));

    let unresolved = schema.unresolved_refs();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].0.to_string(), "#/properties/other");
    assert_eq!(unresolved[0].1, "https://example.com/other.json#/$defs/a");

    let err = schema.validate(&json!({"other": 1}).into()).unwrap_err();
    assert!(err.is_not_yet_implemented());
    assert!(schema.is_valid(&json!({}).into()).unwrap());
}

#[test]
fn test_unresolved_refs_listing() {
    let schema = doc(json!({
        "$defs": {"ok": true},
        "properties": {
            "a": {"$ref": "#/$defs/ok"},
            "b": {"$ref": "#/$defs/nope"}
        }
    }));

    let unresolved = schema.unresolved_refs();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].0.to_string(), "#/properties/b");
    assert_eq!(unresolved[0].1, "#/$defs/nope");
}

#[test]
fn test_validate_at_subschema() {
    let schema = doc(json!({
        "$defs": {"Port": {"type": "integer", "minimum": 1, "maximum": 65535}},
        "type": "object"
    }));
    let validator = Validator::new(&schema);
    let pointer = JsonPointer::parse("#/$defs/Port").unwrap();

    assert!(validator.validate_at(&pointer, &json!(80).into()).unwrap().is_success());
    let failure = unwrap_failure(validator.validate_at(&pointer, &json!(0).into()).unwrap());
    assert_eq!(failure.first().schema_path.to_string(), "#/$defs/Port");

    let missing = JsonPointer::parse("#/$defs/Nope").unwrap();
    assert!(validator.validate_at(&missing, &json!(0).into()).is_err());
}

#[test]
fn test_def_ref_builder() {
    let schema = Document::new(
        SchemaNode::any()
            .def("Flag", true)
            .with_ref("#/$defs/Flag")
            .into(),
    )
    .unwrap();
    assert!(valid(&schema, json!("anything")));

    let by_helper = SchemaNode::def_ref("Flag");
    assert_eq!(by_helper.common.reference.as_deref(), Some("#/$defs/Flag"));
    assert!(by_helper.is_bare_ref());
}
