//! Integration tests for JsonPointer.

use schemata::{JsonPointer, PathSegment};

#[test]
fn test_pointer_construction_and_display() {
    // Root pointer
    assert_eq!(JsonPointer::root().to_string(), "#");

    // Simple field
    assert_eq!(JsonPointer::root().push_field("name").to_string(), "#/name");

    // Simple index
    assert_eq!(JsonPointer::root().push_index(0).to_string(), "#/0");

    // Complex nested pointer
    let path = JsonPointer::root()
        .push_field("users")
        .push_index(0)
        .push_field("address")
        .push_field("city");
    assert_eq!(path.to_string(), "#/users/0/address/city");
    assert_eq!(path.to_plain_string(), "/users/0/address/city");
}

#[test]
fn test_pointer_segments_preserved() {
    let path = JsonPointer::root()
        .push_field("data")
        .push_index(42)
        .push_field("value");

    let segments: Vec<&PathSegment> = path.segments().collect();
    assert_eq!(segments.len(), 3);

    match &segments[1] {
        PathSegment::Index(idx) => assert_eq!(*idx, 42),
        _ => panic!("Expected Index segment"),
    }
}

#[test]
fn test_pointer_is_immutable() {
    let base = JsonPointer::root().push_field("items");

    let first = base.push_index(0);
    let second = base.push_index(1);

    assert_eq!(base.to_string(), "#/items");
    assert_eq!(first.to_string(), "#/items/0");
    assert_eq!(second.to_string(), "#/items/1");
}

#[test]
fn test_escaping_round_trips() {
    let path = JsonPointer::root()
        .push_field("$defs")
        .push_field("a/b")
        .push_field("m~n");
    assert_eq!(path.to_string(), "#/$defs/a~1b/m~0n");

    let parsed = JsonPointer::parse(&path.to_string()).unwrap();
    assert_eq!(parsed.to_string(), path.to_string());
}

#[test]
fn test_fragment_form_is_percent_decoded() {
    let parsed = JsonPointer::parse("#/$defs/a%25b").unwrap();
    match parsed.last() {
        Some(PathSegment::Field(name)) => assert_eq!(name, "a%b"),
        other => panic!("unexpected segment {:?}", other),
    }

    // plain form is taken literally
    let plain = JsonPointer::parse("/a%25b").unwrap();
    assert_eq!(plain.to_plain_string(), "/a%25b");
}

#[test]
fn test_parse_errors() {
    assert!(JsonPointer::parse("#a").is_err());
    assert!(JsonPointer::parse("/a~2").is_err());
    assert!(JsonPointer::parse("#/a%zz").is_err());
    assert!(JsonPointer::parse("").unwrap().is_root());
    assert!(JsonPointer::parse("#").unwrap().is_root());
}

#[test]
fn test_parent() {
    let path = JsonPointer::root().push_field("a").push_index(3);
    assert_eq!(path.parent().unwrap().to_string(), "#/a");
    assert!(JsonPointer::root().parent().is_none());
}
