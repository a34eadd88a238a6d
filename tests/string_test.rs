//! Integration tests for string keywords and format assertion.

use schemata::{Document, StringKeywords, ValidationFailure, ValidationResult, Validator, Value};
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

fn v(value: serde_json::Value) -> Value {
    value.into()
}

#[test]
fn test_length_counts_characters() {
    let schema = doc(json!({"type": "string", "minLength": 2, "maxLength": 3}));

    assert!(schema.is_valid(&v(json!("ab"))).unwrap());
    // two characters, six bytes
    assert!(schema.is_valid(&v(json!("日本"))).unwrap());
    assert!(!schema.is_valid(&v(json!("a"))).unwrap());
    assert!(!schema.is_valid(&v(json!("abcd"))).unwrap());
}

#[test]
fn test_pattern_is_a_search() {
    let schema = doc(json!({"type": "string", "pattern": "[0-9]+"}));
    assert!(schema.is_valid(&v(json!("abc123def"))).unwrap());

    let failure = unwrap_failure(schema.validate(&v(json!("abc"))).unwrap());
    assert_eq!(failure.first().keyword, "pattern");
}

#[test]
fn test_all_string_errors_accumulate() {
    let schema = doc(json!({
        "type": "string",
        "minLength": 5,
        "pattern": "^[a-z]+$"
    }));

    let failure = unwrap_failure(schema.validate(&v(json!("AB"))).unwrap());
    assert_eq!(failure.len(), 2);
    assert_eq!(failure.with_keyword("minLength").len(), 1);
    assert_eq!(failure.with_keyword("pattern").len(), 1);
}

#[test]
fn test_type_mismatch_skips_group() {
    let schema = doc(json!({"type": "string", "minLength": 5}));
    let failure = unwrap_failure(schema.validate(&v(json!(42))).unwrap());

    assert_eq!(failure.len(), 1);
    let error = failure.first();
    assert_eq!(error.keyword, "type");
    assert_eq!(error.code, "invalid_type");
    assert_eq!(error.expected.as_deref(), Some("string"));
    assert_eq!(error.got.as_deref(), Some("integer"));
}

#[test]
fn test_formats_assert_by_default() {
    let cases = [
        ("email", "user@example.com", "not an email"),
        ("date", "2024-02-29", "2023-02-29"),
        ("date-time", "2024-01-15T10:30:00Z", "2024-01-15 10:30"),
        ("ipv4", "192.168.0.1", "256.1.1.1"),
        ("ipv6", "::1", "12345::"),
        ("uuid", "123e4567-e89b-12d3-a456-426614174000", "123e4567"),
        ("uri", "https://example.com/a?b=c", "no scheme"),
        ("json-pointer", "/a/b~1c", "a/b"),
    ];

    for (format, good, bad) in cases {
        let schema = doc(json!({"type": "string", "format": format}));
        assert!(
            schema.is_valid(&v(json!(good))).unwrap(),
            "{} should accept {}",
            format,
            good
        );
        let failure = unwrap_failure(schema.validate(&v(json!(bad))).unwrap());
        assert_eq!(failure.first().keyword, "format", "{} should reject {}", format, bad);
    }
}

#[test]
fn test_unknown_formats_are_annotations() {
    let schema = doc(json!({"type": "string", "format": "x-custom"}));
    assert!(schema.is_valid(&v(json!("anything"))).unwrap());
}

#[test]
fn test_format_assertion_can_be_disabled() {
    let schema = doc(json!({"type": "string", "format": "email"}));
    let validator = Validator::new(&schema).with_format_assertion(false);
    assert!(validator.is_valid(&v(json!("not an email"))).unwrap());
}

#[test]
fn test_builder_matches_parsed_schema() {
    let built = Document::new(
        StringKeywords::new()
            .min_len(1)
            .max_len(10)
            .pattern("^[a-z]+$")
            .unwrap()
            .format("hostname")
            .into(),
    )
    .unwrap();

    let parsed = doc(json!({
        "type": "string",
        "minLength": 1,
        "maxLength": 10,
        "pattern": "^[a-z]+$",
        "format": "hostname"
    }));

    assert_eq!(built, parsed);
}
