//! Integration tests for ValidationError, ValidationFailure and the error enums.

use schemata::{
    Document, Error, EvaluationError, InvalidSchema, JsonPointer, ValidationError,
    ValidationFailure, ValidationResult,
};
use serde_json::json;
use stillwater::prelude::*;
use stillwater::Validation;

fn error_at(field: &str, keyword: &str, message: &str) -> ValidationError {
    ValidationError::new(
        JsonPointer::root().push_field("properties").push_field(field),
        JsonPointer::root().push_field(field),
        keyword,
        message,
    )
}

#[test]
fn test_validation_error_full_context() {
    let error = error_at("email", "format", "string is not a valid email")
        .with_code("invalid_email")
        .with_got("\"not-an-email\"")
        .with_expected("email");

    assert_eq!(error.schema_path.to_string(), "#/properties/email");
    assert_eq!(error.instance_path.to_string(), "#/email");
    assert_eq!(error.keyword, "format");
    assert_eq!(error.code, "invalid_email");
    assert_eq!(error.got, Some("\"not-an-email\"".to_string()));
    assert_eq!(error.expected, Some("email".to_string()));
}

#[test]
fn test_code_defaults_to_keyword() {
    let error = error_at("age", "minimum", "value must be >= 0");
    assert_eq!(error.code, "minimum");
}

#[test]
fn test_failures_never_empty() {
    let failure = ValidationFailure::single(error_at("a", "type", "expected string"));
    assert!(!failure.is_empty());
    assert_eq!(failure.len(), 1);
    assert!(ValidationFailure::from_vec(Vec::new()).is_none());
}

#[test]
fn test_failures_combine_via_semigroup() {
    let e1 = ValidationFailure::single(error_at("name", "required", "name is required"));
    let e2 = ValidationFailure::single(error_at("email", "format", "email is invalid"));
    let e3 = ValidationFailure::single(error_at("age", "minimum", "age must be positive"));

    let combined = e1.combine(e2).combine(e3);

    assert_eq!(combined.len(), 3);
    let keywords: Vec<&str> = combined.iter().map(|e| e.keyword.as_str()).collect();
    assert_eq!(keywords, vec!["required", "format", "minimum"]);
}

#[test]
fn test_failure_queries() {
    let failure = ValidationFailure::single(error_at("a", "type", "expected string"))
        .combine(ValidationFailure::single(error_at("b", "type", "expected number")))
        .combine(ValidationFailure::single(error_at("b", "minimum", "too small")));

    assert_eq!(failure.with_keyword("type").len(), 2);
    assert_eq!(
        failure
            .at_instance_path(&JsonPointer::root().push_field("b"))
            .len(),
        2
    );
    assert_eq!(failure.first().instance_path.to_string(), "#/a");
}

#[test]
fn test_display_includes_locations() {
    let error = error_at("age", "minimum", "value must be >= 0").with_got("-1");
    let text = error.to_string();
    assert!(text.contains("#/age"));
    assert!(text.contains("minimum at #/properties/age"));
    assert!(text.contains("(got: -1)"));
}

#[test]
fn test_validation_result_into_result() {
    let ok: ValidationResult<()> = Validation::Success(());
    let bad: ValidationResult<()> =
        Validation::Failure(ValidationFailure::single(error_at("a", "type", "wrong")));

    assert!(ok.into_result().is_ok());
    let failure = bad.into_result().unwrap_err();
    assert_eq!(failure.first().keyword, "type");
}

#[test]
fn test_invalid_schema_display() {
    let err = InvalidSchema::new(
        JsonPointer::root().push_field("properties").push_field("tags"),
        "items",
        "is not valid for type 'string'",
    );
    let text = err.to_string();
    assert!(text.contains("#/properties/tags"));
    assert!(text.contains("items"));
}

#[test]
fn test_assert_valid_maps_to_umbrella_error() {
    let doc = Document::from_json(&json!({"type": "string"}).into()).unwrap();

    assert!(doc.assert_valid(&json!("ok").into()).is_ok());
    match doc.assert_valid(&json!(1).into()) {
        Err(Error::InvalidValue(failure)) => {
            assert_eq!(failure.first().code, "invalid_type");
        }
        other => panic!("expected invalid value, got {:?}", other),
    }
}

#[test]
fn test_evaluation_errors_are_not_failures() {
    let doc = Document::from_json(&json!({"$ref": "#/$defs/missing"}).into()).unwrap();
    match doc.assert_valid(&json!(1).into()) {
        Err(Error::Evaluation(EvaluationError::UnresolvableReference { reference, .. })) => {
            assert_eq!(reference, "#/$defs/missing");
        }
        other => panic!("expected unresolvable reference, got {:?}", other),
    }
}
