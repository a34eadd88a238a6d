//! The schema node model.
//!
//! A schema is either a boolean ([`Schema::Bool`]) or a [`SchemaNode`]. A node
//! is tagged by its declared type ([`NodeKind`]) and carries the keyword group
//! for that type, plus the keywords every node shares: metadata, `enum`,
//! `const`, `$ref`, `$defs` and the [`Combinators`].
//!
//! Subschemas are held behind `Arc`, so a built schema is an immutable tree
//! that can be shared across threads. `$ref` stays a string and is resolved
//! through the document index during validation.
//!
//! # Example
//!
//! ```rust
//! use schemata::{Document, ObjectKeywords, SchemaNode, StringKeywords};
//! use serde_json::json;
//!
//! let schema = SchemaNode::object(
//!     ObjectKeywords::new().field("name", StringKeywords::new().min_len(1)),
//! )
//! .title("Person");
//!
//! let doc = Document::new(schema.into()).unwrap();
//! assert!(doc.is_valid(&json!({"name": "Ada"}).into()).unwrap());
//! ```

mod array;
mod combinators;
pub mod format;
mod numeric;
mod object;
pub(crate) mod reference;
mod string;
mod traits;

use std::fmt::{self, Display};
use std::sync::Arc;

use indexmap::IndexMap;

pub use array::ArrayKeywords;
pub use combinators::Combinators;
pub use numeric::NumericKeywords;
pub use object::{ObjectKeywords, PatternProperty};
pub use string::{Pattern, StringKeywords};
pub use traits::KeywordGroup;

use crate::error::{EvaluationError, ValidationError};
use crate::path::{escape_segment, PathSegment};
use crate::validator::{Location, ValidationContext};
use crate::value::Value;

/// Keywords every node may carry regardless of its declared type.
pub const COMMON_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "$anchor",
    "$dynamicAnchor",
    "$ref",
    "type",
    "title",
    "description",
    "default",
    "examples",
    "deprecated",
    "readOnly",
    "writeOnly",
    "enum",
    "const",
    "$comment",
    "$defs",
];

/// Annotation keywords kept verbatim and never evaluated.
pub const ANNOTATION_KEYWORDS: &[&str] = &[
    "$vocabulary",
    "contentEncoding",
    "contentMediaType",
    "contentSchema",
];

/// Keywords that are recognized and preserved, but whose evaluation is not
/// implemented. Validating a node that carries one fails with
/// [`EvaluationError::NotYetImplemented`].
pub const UNSUPPORTED_KEYWORDS: &[&str] = &[
    "$dynamicRef",
    "$recursiveRef",
    "$recursiveAnchor",
    "unevaluatedProperties",
    "unevaluatedItems",
];

/// The seven JSON Schema instance types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceType {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl InstanceType {
    /// Returns the name used by the `type` keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceType::Object => "object",
            InstanceType::Array => "array",
            InstanceType::String => "string",
            InstanceType::Integer => "integer",
            InstanceType::Number => "number",
            InstanceType::Boolean => "boolean",
            InstanceType::Null => "null",
        }
    }

    /// Parses a `type` keyword name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "object" => InstanceType::Object,
            "array" => InstanceType::Array,
            "string" => InstanceType::String,
            "integer" => InstanceType::Integer,
            "number" => InstanceType::Number,
            "boolean" => InstanceType::Boolean,
            "null" => InstanceType::Null,
            _ => return None,
        })
    }

    /// Returns true if `value` is an instance of this type.
    ///
    /// Integers are whole numbers, so `1.0` is an integer.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (InstanceType::Object, Value::Object(_)) => true,
            (InstanceType::Array, Value::Array(_)) => true,
            (InstanceType::String, Value::String(_)) => true,
            (InstanceType::Integer, Value::Number(n)) => n.is_whole(),
            (InstanceType::Number, Value::Number(_)) => true,
            (InstanceType::Boolean, Value::Bool(_)) => true,
            (InstanceType::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords of a node without a single declared type.
///
/// `types` is empty for a node with no `type` keyword, or lists the members of
/// a `type` array. Every keyword group may be present; each one only applies to
/// instances of its own kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnyKeywords {
    /// Allowed instance types; empty means unrestricted.
    pub types: Vec<InstanceType>,
    /// Object keywords.
    pub object: ObjectKeywords,
    /// Array keywords.
    pub array: ArrayKeywords,
    /// String keywords.
    pub string: StringKeywords,
    /// Numeric keywords.
    pub numeric: NumericKeywords,
}

/// A node's declared type together with the keywords specific to it.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object(ObjectKeywords),
    Array(ArrayKeywords),
    String(StringKeywords),
    Integer(NumericKeywords),
    Number(NumericKeywords),
    Boolean,
    Null,
    Any(AnyKeywords),
}

impl NodeKind {
    /// Returns the single declared type, or `None` for [`NodeKind::Any`].
    pub fn declared_type(&self) -> Option<InstanceType> {
        match self {
            NodeKind::Object(_) => Some(InstanceType::Object),
            NodeKind::Array(_) => Some(InstanceType::Array),
            NodeKind::String(_) => Some(InstanceType::String),
            NodeKind::Integer(_) => Some(InstanceType::Integer),
            NodeKind::Number(_) => Some(InstanceType::Number),
            NodeKind::Boolean => Some(InstanceType::Boolean),
            NodeKind::Null => Some(InstanceType::Null),
            NodeKind::Any(_) => None,
        }
    }

    /// Returns the types an instance may have; empty means unrestricted.
    pub fn allowed_types(&self) -> Vec<InstanceType> {
        match self {
            NodeKind::Any(any) => any.types.clone(),
            other => other.declared_type().into_iter().collect(),
        }
    }

    /// Returns true if the node's type check accepts `value`.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            NodeKind::Any(any) => any.types.is_empty() || any.types.iter().any(|t| t.matches(value)),
            other => other
                .declared_type()
                .map_or(true, |t| t.matches(value)),
        }
    }

    pub(crate) fn subschemas(&self) -> Vec<(Vec<PathSegment>, &Arc<Schema>)> {
        match self {
            NodeKind::Object(k) => k.subschemas(),
            NodeKind::Array(k) => k.subschemas(),
            NodeKind::Any(any) => {
                let mut out = any.object.subschemas();
                out.extend(any.array.subschemas());
                out
            }
            _ => Vec::new(),
        }
    }

    /// Evaluates the type-specific keywords.
    pub(crate) fn evaluate(
        &self,
        value: &Value,
        at: &Location,
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationError>, EvaluationError> {
        match self {
            NodeKind::Object(k) => k.evaluate(value, at, ctx),
            NodeKind::Array(k) => k.evaluate(value, at, ctx),
            NodeKind::String(k) => k.evaluate(value, at, ctx),
            NodeKind::Integer(k) | NodeKind::Number(k) => k.evaluate(value, at, ctx),
            NodeKind::Boolean | NodeKind::Null => Ok(Vec::new()),
            NodeKind::Any(any) => {
                let mut errors = any.object.evaluate(value, at, ctx)?;
                errors.extend(any.array.evaluate(value, at, ctx)?);
                errors.extend(any.string.evaluate(value, at, ctx)?);
                errors.extend(any.numeric.evaluate(value, at, ctx)?);
                Ok(errors)
            }
        }
    }
}

/// Keywords shared by every node: identification, metadata, value
/// constraints, `$ref` and `$defs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonKeywords {
    /// `$schema`
    pub schema_uri: Option<String>,
    /// `$id`
    pub id: Option<String>,
    /// `$anchor`
    pub anchor: Option<String>,
    /// `$dynamicAnchor`
    pub dynamic_anchor: Option<String>,
    /// `$comment`
    pub comment: Option<String>,
    /// `title`
    pub title: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// `default`
    pub default: Option<Value>,
    /// `examples`
    pub examples: Option<Vec<Value>>,
    /// `deprecated`
    pub deprecated: bool,
    /// `readOnly`
    pub read_only: bool,
    /// `writeOnly`
    pub write_only: bool,
    /// `enum`
    pub enum_values: Option<Vec<Value>>,
    /// `const`
    pub const_value: Option<Value>,
    /// `$ref`
    pub reference: Option<String>,
    /// `$defs`
    pub defs: IndexMap<String, Arc<Schema>>,
    /// Annotation keywords, and unknown keywords when they are preserved.
    pub extra: IndexMap<String, Value>,
    /// Recognized keywords that cannot be evaluated.
    pub unsupported: IndexMap<String, Value>,
}

/// A schema object: a declared type with its keywords.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    /// Declared type and type-specific keywords.
    pub kind: NodeKind,
    /// Keywords shared by all nodes.
    pub common: CommonKeywords,
    /// `allOf`, `anyOf`, `oneOf`, `not`, `if`/`then`/`else`.
    pub combinators: Combinators,
}

impl SchemaNode {
    /// Creates a node of the given kind with no other keywords.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            common: CommonKeywords::default(),
            combinators: Combinators::default(),
        }
    }

    /// Creates an `object` node.
    pub fn object(keywords: ObjectKeywords) -> Self {
        Self::new(NodeKind::Object(keywords))
    }

    /// Creates an `array` node.
    pub fn array(keywords: ArrayKeywords) -> Self {
        Self::new(NodeKind::Array(keywords))
    }

    /// Creates a `string` node.
    pub fn string(keywords: StringKeywords) -> Self {
        Self::new(NodeKind::String(keywords))
    }

    /// Creates an `integer` node.
    pub fn integer(keywords: NumericKeywords) -> Self {
        Self::new(NodeKind::Integer(keywords))
    }

    /// Creates a `number` node.
    pub fn number(keywords: NumericKeywords) -> Self {
        Self::new(NodeKind::Number(keywords))
    }

    /// Creates a `boolean` node.
    pub fn boolean() -> Self {
        Self::new(NodeKind::Boolean)
    }

    /// Creates a `null` node.
    pub fn null() -> Self {
        Self::new(NodeKind::Null)
    }

    /// Creates an untyped node that accepts every value.
    pub fn any() -> Self {
        Self::new(NodeKind::Any(AnyKeywords::default()))
    }

    /// Creates an untyped node holding only a `$ref`.
    pub fn reference(reference: impl Into<String>) -> Self {
        Self::any().with_ref(reference)
    }

    /// Creates a reference to `#/$defs/<name>`.
    ///
    /// ```rust
    /// use schemata::SchemaNode;
    ///
    /// let node = SchemaNode::def_ref("a/b");
    /// assert_eq!(node.common.reference.as_deref(), Some("#/$defs/a~1b"));
    /// ```
    pub fn def_ref(name: &str) -> Self {
        Self::reference(format!("#/$defs/{}", escape_segment(name)))
    }

    /// Creates the union shape: an untyped node that matches exactly one of
    /// `candidates`.
    ///
    /// ```rust
    /// use schemata::{Document, SchemaNode, StringKeywords};
    ///
    /// let union = SchemaNode::union([
    ///     SchemaNode::string(StringKeywords::new()),
    ///     SchemaNode::null(),
    /// ]);
    ///
    /// let doc = Document::new(union.into()).unwrap();
    /// assert!(doc.is_valid(&"text".into()).unwrap());
    /// assert!(doc.is_valid(&schemata::Value::Null).unwrap());
    /// assert!(!doc.is_valid(&1.into()).unwrap());
    /// ```
    pub fn union<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Schema>,
    {
        Self::any().one_of(candidates)
    }

    /// Returns the single declared type, if any.
    pub fn declared_type(&self) -> Option<InstanceType> {
        self.kind.declared_type()
    }

    /// Returns true if the node has no keywords other than `$ref`.
    pub fn is_bare_ref(&self) -> bool {
        self.common.reference.is_some()
            && self.common == CommonKeywords {
                reference: self.common.reference.clone(),
                ..CommonKeywords::default()
            }
            && self.combinators.is_empty()
            && self.kind == NodeKind::Any(AnyKeywords::default())
    }

    /// Returns every direct subschema with the pointer segments leading to it.
    pub fn subschemas(&self) -> Vec<(Vec<PathSegment>, &Arc<Schema>)> {
        let mut out = self.kind.subschemas();
        out.extend(self.combinators.subschemas());
        for (name, schema) in &self.common.defs {
            out.push((
                vec![PathSegment::field("$defs"), PathSegment::field(name)],
                schema,
            ));
        }
        out
    }

    /// Sets `title`.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.common.title = Some(title.into());
        self
    }

    /// Sets `description`.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.common.description = Some(description.into());
        self
    }

    /// Sets `default`.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.common.default = Some(value.into());
        self
    }

    /// Appends to `examples`.
    pub fn example(mut self, value: impl Into<Value>) -> Self {
        self.common
            .examples
            .get_or_insert_with(Vec::new)
            .push(value.into());
        self
    }

    /// Marks the node `deprecated`.
    pub fn deprecated(mut self) -> Self {
        self.common.deprecated = true;
        self
    }

    /// Marks the node `readOnly`.
    pub fn read_only(mut self) -> Self {
        self.common.read_only = true;
        self
    }

    /// Marks the node `writeOnly`.
    pub fn write_only(mut self) -> Self {
        self.common.write_only = true;
        self
    }

    /// Sets `enum`.
    pub fn enum_values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.common.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Sets `const`.
    pub fn const_value(mut self, value: impl Into<Value>) -> Self {
        self.common.const_value = Some(value.into());
        self
    }

    /// Sets `$id`.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.common.id = Some(id.into());
        self
    }

    /// Sets `$anchor`.
    pub fn anchor(mut self, anchor: impl Into<String>) -> Self {
        self.common.anchor = Some(anchor.into());
        self
    }

    /// Sets `$comment`.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.common.comment = Some(comment.into());
        self
    }

    /// Sets `$ref`.
    pub fn with_ref(mut self, reference: impl Into<String>) -> Self {
        self.common.reference = Some(reference.into());
        self
    }

    /// Adds an entry to `$defs`.
    pub fn def(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.common.defs.insert(name.into(), Arc::new(schema.into()));
        self
    }

    /// Appends to `allOf`.
    pub fn all_of<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Schema>,
    {
        self.combinators
            .all_of
            .extend(schemas.into_iter().map(|s| Arc::new(s.into())));
        self
    }

    /// Appends to `anyOf`.
    pub fn any_of<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Schema>,
    {
        self.combinators
            .any_of
            .extend(schemas.into_iter().map(|s| Arc::new(s.into())));
        self
    }

    /// Appends to `oneOf`.
    pub fn one_of<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Schema>,
    {
        self.combinators
            .one_of
            .extend(schemas.into_iter().map(|s| Arc::new(s.into())));
        self
    }

    /// Sets `not`.
    pub fn not(mut self, schema: impl Into<Schema>) -> Self {
        self.combinators.not = Some(Arc::new(schema.into()));
        self
    }

    /// Sets `if`, with optional `then` and `else` branches.
    pub fn if_then_else(
        mut self,
        condition: impl Into<Schema>,
        then: Option<Schema>,
        otherwise: Option<Schema>,
    ) -> Self {
        self.combinators.if_schema = Some(Arc::new(condition.into()));
        self.combinators.then_schema = then.map(Arc::new);
        self.combinators.else_schema = otherwise.map(Arc::new);
        self
    }
}

/// A schema: a boolean schema or a schema object.
///
/// `true` accepts every value and `false` rejects every value.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Bool(bool),
    Node(SchemaNode),
}

impl Schema {
    /// Returns the node, or `None` for a boolean schema.
    pub fn as_node(&self) -> Option<&SchemaNode> {
        match self {
            Schema::Node(node) => Some(node),
            Schema::Bool(_) => None,
        }
    }

    /// Returns the boolean, or `None` for a schema object.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Schema::Bool(b) => Some(*b),
            Schema::Node(_) => None,
        }
    }

    /// Returns every direct subschema with the pointer segments leading to it.
    pub fn subschemas(&self) -> Vec<(Vec<PathSegment>, &Arc<Schema>)> {
        match self {
            Schema::Node(node) => node.subschemas(),
            Schema::Bool(_) => Vec::new(),
        }
    }
}

impl From<bool> for Schema {
    fn from(b: bool) -> Self {
        Schema::Bool(b)
    }
}

impl From<SchemaNode> for Schema {
    fn from(node: SchemaNode) -> Self {
        Schema::Node(node)
    }
}

impl From<ObjectKeywords> for SchemaNode {
    fn from(keywords: ObjectKeywords) -> Self {
        SchemaNode::object(keywords)
    }
}

impl From<ArrayKeywords> for SchemaNode {
    fn from(keywords: ArrayKeywords) -> Self {
        SchemaNode::array(keywords)
    }
}

impl From<StringKeywords> for SchemaNode {
    fn from(keywords: StringKeywords) -> Self {
        SchemaNode::string(keywords)
    }
}

impl From<ObjectKeywords> for Schema {
    fn from(keywords: ObjectKeywords) -> Self {
        Schema::Node(keywords.into())
    }
}

impl From<ArrayKeywords> for Schema {
    fn from(keywords: ArrayKeywords) -> Self {
        Schema::Node(keywords.into())
    }
}

impl From<StringKeywords> for Schema {
    fn from(keywords: StringKeywords) -> Self {
        Schema::Node(keywords.into())
    }
}
