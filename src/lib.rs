//! # Schemata
//!
//! A JSON Schema draft 2020-12 engine that accumulates ALL validation errors,
//! providing comprehensive feedback rather than short-circuiting on the first
//! failure.
//!
//! ## Overview
//!
//! A schema document is parsed into a typed node model, indexed by JSON
//! Pointer, `$id` and `$anchor`, and evaluated against instance values.
//! Failures are collected with stillwater's `Validation` type, so one call
//! reports every violated keyword. The model serializes back to canonical JSON,
//! and parsing that JSON yields an equal model.
//!
//! ## Core Types
//!
//! - [`Value`]: JSON-like data, for both schemas and instances
//! - [`JsonPointer`]: RFC 6901 pointer for schema and instance locations
//! - [`Schema`] / [`SchemaNode`]: the node model, with keyword groups per type
//! - [`Document`]: a parsed, indexed schema
//! - [`Validator`]: evaluates instances against a document
//! - [`ValidationFailure`]: a non-empty collection of [`ValidationError`]s
//!
//! ## Example
//!
//! ```rust
//! use schemata::Document;
//! use serde_json::json;
//!
//! let doc = Document::from_json(&json!({
//!     "type": "object",
//!     "properties": {
//!         "name": {"type": "string", "minLength": 1},
//!         "age": {"type": "integer", "minimum": 0}
//!     },
//!     "required": ["name", "age"]
//! }).into())
//! .unwrap();
//!
//! assert!(doc.is_valid(&json!({"name": "Ada", "age": 36}).into()).unwrap());
//!
//! // Both violations are reported
//! let result = doc.validate(&json!({"name": "", "age": -1}).into()).unwrap();
//! assert!(result.is_failure());
//! ```

pub mod conformance;
pub mod document;
pub mod error;
pub mod index;
pub mod parser;
pub mod path;
pub mod registry;
pub mod schema;
pub mod serializer;
pub mod validator;
pub mod value;

pub use document::Document;
pub use error::{Error, EvaluationError, InvalidSchema, ValidationError, ValidationFailure};
pub use index::DocumentIndex;
pub use parser::{ParseOptions, Parser, Placement, UnknownKeywords, DRAFT_2020_12};
pub use path::{JsonPointer, PathSegment};
pub use registry::{RegistryError, SchemaRegistry};
pub use schema::{
    AnyKeywords, ArrayKeywords, Combinators, CommonKeywords, InstanceType, KeywordGroup,
    NodeKind, NumericKeywords, ObjectKeywords, Pattern, PatternProperty, Schema, SchemaNode,
    StringKeywords,
};
pub use validator::{Location, ValidationContext, ValidationOptions, Validator};
pub use value::{Map, Number, Value};

/// Type alias for validation results using ValidationFailure
pub type ValidationResult<T> = stillwater::Validation<T, ValidationFailure>;
