//! Tests for recursive schema structures and depth tracking.

use schemata::validator::DEFAULT_MAX_DEPTH;
use schemata::{Document, EvaluationError, Validator, Value};
use serde_json::json;

fn person_schema() -> Document {
    Document::from_json(
        &json!({
            "$defs": {
                "Person": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "father": {"$ref": "#/$defs/Person"}
                    },
                    "required": ["name"]
                }
            },
            "$ref": "#/$defs/Person"
        })
        .into(),
    )
    .unwrap()
}

fn lineage(depth: usize) -> serde_json::Value {
    let mut person = json!({"name": "root"});
    for generation in 0..depth {
        person = json!({"name": format!("g{}", generation), "father": person});
    }
    person
}

#[test]
fn test_self_referencing_schema() {
    let schema = Document::from_json(
        &json!({
            "type": "object",
            "properties": {
                "text": {"type": "string"},
                "replies": {"type": "array", "items": {"$ref": "#"}}
            },
            "required": ["text"]
        })
        .into(),
    )
    .unwrap();

    let comment = json!({
        "text": "Top comment",
        "replies": [
            {"text": "Reply 1"},
            {"text": "Reply 2", "replies": [{"text": "Nested reply"}]}
        ]
    });
    assert!(schema.is_valid(&comment.into()).unwrap());

    let broken = json!({"text": "Top", "replies": [{"replies": []}]});
    assert!(!schema.is_valid(&broken.into()).unwrap());
}

#[test]
fn test_recursion_follows_instance_depth() {
    let schema = person_schema();

    assert!(schema.is_valid(&lineage(0).into()).unwrap());
    assert!(schema.is_valid(&lineage(1).into()).unwrap());
    assert!(schema.is_valid(&lineage(60).into()).unwrap());
}

#[test]
fn test_default_depth_fits_any_decodable_instance() {
    // serde_json refuses to decode nesting deeper than 128
    let text = lineage(126).to_string();
    let decoded: Value = text.parse().unwrap();

    let valid = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(move || {
            let schema = person_schema();
            schema.is_valid(&decoded).unwrap() && schema.is_valid(&lineage(150).into()).unwrap()
        })
        .unwrap()
        .join()
        .unwrap();
    assert!(valid);
}

#[test]
fn test_error_deep_in_recursion_has_full_instance_path() {
    let schema = person_schema();
    let value = json!({"name": "a", "father": {"name": "b", "father": {"name": 3}}});

    let result = schema.validate(&value.into()).unwrap();
    let failure = result.into_result().unwrap_err();
    let error = failure.first();
    assert_eq!(error.instance_path.to_string(), "#/father/father/name");
    assert_eq!(error.schema_path.to_string(), "#/$defs/Person/properties/name");
}

#[test]
fn test_depth_limit_stops_deep_instances() {
    let schema = person_schema();
    let validator = Validator::new(&schema).with_max_depth(5);

    assert!(validator.is_valid(&lineage(3).into()).unwrap());

    match validator.validate(&Value::from(lineage(10))) {
        Err(EvaluationError::RecursionLimitExceeded { limit, .. }) => assert_eq!(limit, 5),
        other => panic!("expected recursion limit, got {:?}", other),
    }
}

#[test]
fn test_instance_independent_cycle_hits_limit() {
    let schema = Document::from_json(
        &json!({
            "$defs": {
                "a": {"$ref": "#/$defs/b"},
                "b": {"$ref": "#/$defs/a"}
            },
            "$ref": "#/$defs/a"
        })
        .into(),
    )
    .unwrap();

    let err = schema.validate(&json!(1).into()).unwrap_err();
    assert!(matches!(
        err,
        EvaluationError::RecursionLimitExceeded { limit, .. } if limit == DEFAULT_MAX_DEPTH
    ));
}

#[test]
fn test_mutually_recursive_schemas() {
    let schema = Document::from_json(
        &json!({
            "$defs": {
                "A": {
                    "type": "object",
                    "properties": {"name": {"type": "string"}, "b": {"$ref": "#/$defs/B"}},
                    "required": ["name"]
                },
                "B": {
                    "type": "object",
                    "properties": {"value": {"type": "integer"}, "a": {"$ref": "#/$defs/A"}},
                    "required": ["value"]
                }
            },
            "$ref": "#/$defs/A"
        })
        .into(),
    )
    .unwrap();

    let value = json!({"name": "x", "b": {"value": 1, "a": {"name": "y", "b": {"value": 2}}}});
    assert!(schema.is_valid(&value.into()).unwrap());

    let bad = json!({"name": "x", "b": {"value": 1, "a": {"name": "y", "b": {"value": "2"}}}});
    assert!(!schema.is_valid(&bad.into()).unwrap());
}

#[test]
fn test_unreached_cycle_is_harmless() {
    let schema = Document::from_json(
        &json!({
            "$defs": {"loop": {"$ref": "#/$defs/loop"}},
            "type": "string"
        })
        .into(),
    )
    .unwrap();

    assert!(schema.is_valid(&json!("fine").into()).unwrap());
}
