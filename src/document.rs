//! Parsed and indexed schema documents.

use std::sync::Arc;

use crate::error::{Error, EvaluationError, InvalidSchema};
use crate::index::DocumentIndex;
use crate::parser::{ParseOptions, Parser};
use crate::path::JsonPointer;
use crate::schema::Schema;
use crate::serializer;
use crate::validator::Validator;
use crate::value::Value;
use crate::ValidationResult;

/// A schema together with its pointer and identifier index.
///
/// A document is immutable once built and can be shared across threads;
/// validation never mutates it.
///
/// # Example
///
/// ```rust
/// use schemata::Document;
/// use serde_json::json;
///
/// let doc = Document::from_json(&json!({
///     "$defs": {"port": {"type": "integer", "minimum": 1, "maximum": 65535}},
///     "type": "object",
///     "properties": {"port": {"$ref": "#/$defs/port"}}
/// }).into())
/// .unwrap();
///
/// assert!(doc.is_valid(&json!({"port": 8080}).into()).unwrap());
/// assert!(!doc.is_valid(&json!({"port": 0}).into()).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    root: Arc<Schema>,
    index: DocumentIndex,
}

impl Document {
    /// Indexes a schema built in code or by the parser.
    ///
    /// Fails if an `$anchor` is malformed or declared twice in one resource.
    pub fn new(root: Schema) -> Result<Self, InvalidSchema> {
        let root = Arc::new(root);
        let index = DocumentIndex::build(&root)?;
        Ok(Self { root, index })
    }

    /// Parses a document with the default (strict) options.
    pub fn from_json(value: &Value) -> Result<Self, InvalidSchema> {
        Parser::default().parse(value)
    }

    /// Parses a document with the given options.
    pub fn from_json_with(value: &Value, options: ParseOptions) -> Result<Self, InvalidSchema> {
        Parser::new(options).parse(value)
    }

    /// Parses a document from JSON text.
    pub fn from_str_with(text: &str, options: ParseOptions) -> Result<Self, Error> {
        let value: Value = text.parse().map_err(|e: serde_json::Error| {
            Error::InvalidSchema(InvalidSchema::new(
                JsonPointer::root(),
                "",
                format!("is not valid JSON: {}", e),
            ))
        })?;
        Ok(Self::from_json_with(&value, options)?)
    }

    /// Serializes the document in canonical keyword order.
    pub fn to_json(&self) -> Value {
        serializer::to_value(&self.root)
    }

    /// Returns the root schema.
    pub fn root(&self) -> &Schema {
        &self.root
    }

    /// Returns the draft named by the root `$schema`, if any.
    pub fn draft(&self) -> Option<&str> {
        self.root
            .as_node()
            .and_then(|node| node.common.schema_uri.as_deref())
    }

    /// Returns the index of every node in the document.
    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Returns a validator with default options.
    pub fn validator(&self) -> Validator<'_> {
        Validator::new(self)
    }

    /// Validates `value` with default options.
    pub fn validate(&self, value: &Value) -> Result<ValidationResult<()>, EvaluationError> {
        self.validator().validate(value)
    }

    /// Returns true if `value` is valid with default options.
    pub fn is_valid(&self, value: &Value) -> Result<bool, EvaluationError> {
        self.validator().is_valid(value)
    }

    /// Fails with [`Error::InvalidValue`] if `value` is not valid.
    pub fn assert_valid(&self, value: &Value) -> Result<(), Error> {
        self.validator().assert_valid(value)
    }

    /// Lists `$ref`s that cannot be resolved within the document, together
    /// with the pointer of the node that holds each one.
    ///
    /// References to other documents are included: they are never fetched or
    /// looked up, and evaluating one fails with
    /// [`EvaluationError::NotYetImplemented`].
    pub fn unresolved_refs(&self) -> Vec<(JsonPointer, String)> {
        self.index.unresolved()
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}
