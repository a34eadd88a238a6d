//! Conversion from JSON values to the schema node model.
//!
//! This module provides [`Parser`] and its [`ParseOptions`]. The parser walks a
//! schema document depth-first in property order and reports the first
//! malformed or misplaced keyword as an [`InvalidSchema`] naming the node's
//! pointer and the keyword.
//!
//! # Keyword placement
//!
//! A node's declared type comes from `type`. A single type (or a one-element
//! array) gives a typed node, which only accepts the keyword group of its
//! type. A `type` array with several members, or no `type` at all, gives an
//! untyped node that accepts every group.
//!
//! ```rust
//! use schemata::{Document, JsonPointer};
//! use serde_json::json;
//!
//! let err = Document::from_json(&json!({
//!     "type": "object",
//!     "properties": {"tags": {"type": "string", "items": {"type": "string"}}}
//! }).into())
//! .unwrap_err();
//!
//! assert_eq!(err.pointer.to_string(), "#/properties/tags");
//! assert_eq!(err.keyword, "items");
//! ```

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::InvalidSchema;
use crate::path::JsonPointer;
use crate::schema::format::KNOWN_FORMATS;
use crate::schema::{
    AnyKeywords, ArrayKeywords, Combinators, CommonKeywords, InstanceType, KeywordGroup, NodeKind,
    NumericKeywords, ObjectKeywords, Pattern, PatternProperty, Schema, SchemaNode,
    StringKeywords, ANNOTATION_KEYWORDS, UNSUPPORTED_KEYWORDS,
};
use crate::value::{Map, Number, Value};

/// The only draft this engine evaluates.
pub const DRAFT_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// How keyword groups foreign to a node's declared type are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// A foreign keyword is an [`InvalidSchema`] error.
    #[default]
    Strict,
    /// The node becomes untyped, restricted to its declared type, and keeps
    /// every group. Other drafts named by `$schema` are accepted with a warning.
    Lenient,
}

/// How keywords the engine does not know are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeywords {
    /// An unknown keyword is an [`InvalidSchema`] error.
    #[default]
    Reject,
    /// Unknown keywords are kept verbatim and serialized back out.
    Preserve,
}

/// Parser configuration.
///
/// The default is strict placement and rejection of unknown keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Foreign keyword groups.
    pub placement: Placement,
    /// Unknown keywords.
    pub unknown_keywords: UnknownKeywords,
}

impl ParseOptions {
    /// Strict placement, unknown keywords rejected.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Lenient placement, unknown keywords preserved.
    ///
    /// This is the profile for schemas written without keyword discipline,
    /// such as the official conformance corpus.
    pub fn lenient() -> Self {
        Self {
            placement: Placement::Lenient,
            unknown_keywords: UnknownKeywords::Preserve,
        }
    }

    /// Sets the placement mode.
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the unknown keyword mode.
    pub fn with_unknown_keywords(mut self, mode: UnknownKeywords) -> Self {
        self.unknown_keywords = mode;
        self
    }
}

/// Builds [`Document`]s from JSON values.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    /// Creates a parser.
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Returns the options in use.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parses and indexes a whole document.
    pub fn parse(&self, value: &Value) -> Result<Document, InvalidSchema> {
        let root = match value {
            Value::Bool(b) => Schema::Bool(*b),
            Value::Object(map) => Schema::Node(self.parse_node(map, &JsonPointer::root())?),
            other => {
                return Err(InvalidSchema::new(
                    JsonPointer::root(),
                    "",
                    format!("document must be an object or a boolean, got {}", other.kind_name()),
                ))
            }
        };
        let document = Document::new(root)?;
        debug!(
            nodes = document.index().len(),
            placement = ?self.options.placement,
            "parsed schema document"
        );
        Ok(document)
    }

    /// Parses the subschema held by `keyword` of the node at `owner`.
    fn subschema(
        &self,
        value: &Value,
        owner: &JsonPointer,
        keyword: &str,
        pointer: JsonPointer,
    ) -> Result<Arc<Schema>, InvalidSchema> {
        match value {
            Value::Bool(b) => Ok(Arc::new(Schema::Bool(*b))),
            Value::Object(map) => Ok(Arc::new(Schema::Node(self.parse_node(map, &pointer)?))),
            other => Err(InvalidSchema::new(
                owner.clone(),
                keyword,
                format!("must hold a schema (object or boolean), got {}", other.kind_name()),
            )),
        }
    }

    fn parse_node(&self, map: &Map, pointer: &JsonPointer) -> Result<SchemaNode, InvalidSchema> {
        let declared = declared_types(map, pointer)?;
        let mut node = NodeBuilder {
            parser: self,
            pointer,
            declared_type: match declared.as_slice() {
                [single] => Some(*single),
                _ => None,
            },
            widened: false,
            common: CommonKeywords::default(),
            combinators: Combinators::default(),
            object: ObjectKeywords::default(),
            array: ArrayKeywords::default(),
            string: StringKeywords::default(),
            numeric: NumericKeywords::default(),
        };

        for (keyword, value) in map {
            node.keyword(keyword, value)?;
        }

        Ok(node.finish(declared))
    }
}

/// Reads the `type` keyword.
fn declared_types(map: &Map, pointer: &JsonPointer) -> Result<Vec<InstanceType>, InvalidSchema> {
    let invalid = |reason: String| InvalidSchema::new(pointer.clone(), "type", reason);
    let name_to_type = |name: &str| {
        InstanceType::from_name(name).ok_or_else(|| invalid(format!("names unknown type '{}'", name)))
    };

    match map.get("type") {
        None => Ok(Vec::new()),
        Some(Value::String(name)) => Ok(vec![name_to_type(name)?]),
        Some(Value::Array(names)) => {
            if names.is_empty() {
                return Err(invalid("must not be an empty array".to_string()));
            }
            let mut types = Vec::with_capacity(names.len());
            for name in names {
                let t = name
                    .as_str()
                    .ok_or_else(|| invalid("must contain only type names".to_string()))
                    .and_then(name_to_type)?;
                if types.contains(&t) {
                    return Err(invalid(format!("lists '{}' more than once", t)));
                }
                types.push(t);
            }
            Ok(types)
        }
        Some(other) => Err(invalid(format!(
            "must be a string or an array, got {}",
            other.kind_name()
        ))),
    }
}

/// Which keyword group a keyword belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Object,
    Array,
    String,
    Numeric,
}

impl Group {
    fn of(keyword: &str) -> Option<Self> {
        if ObjectKeywords::owns(keyword) {
            Some(Group::Object)
        } else if ArrayKeywords::owns(keyword) {
            Some(Group::Array)
        } else if StringKeywords::owns(keyword) {
            Some(Group::String)
        } else if NumericKeywords::owns(keyword) {
            Some(Group::Numeric)
        } else {
            None
        }
    }

    fn belongs_to(self, t: InstanceType) -> bool {
        matches!(
            (self, t),
            (Group::Object, InstanceType::Object)
                | (Group::Array, InstanceType::Array)
                | (Group::String, InstanceType::String)
                | (Group::Numeric, InstanceType::Integer)
                | (Group::Numeric, InstanceType::Number)
        )
    }
}

/// Accumulates the keywords of one node while it is parsed.
struct NodeBuilder<'p> {
    parser: &'p Parser,
    pointer: &'p JsonPointer,
    declared_type: Option<InstanceType>,
    widened: bool,
    common: CommonKeywords,
    combinators: Combinators,
    object: ObjectKeywords,
    array: ArrayKeywords,
    string: StringKeywords,
    numeric: NumericKeywords,
}

impl NodeBuilder<'_> {
    fn invalid(&self, keyword: &str, reason: impl Into<String>) -> InvalidSchema {
        InvalidSchema::new(self.pointer.clone(), keyword, reason)
    }

    fn keyword(&mut self, keyword: &str, value: &Value) -> Result<(), InvalidSchema> {
        if keyword == "type" {
            return Ok(());
        }

        if let Some(group) = Group::of(keyword) {
            self.check_placement(keyword, group)?;
            return match group {
                Group::Object => self.object_keyword(keyword, value),
                Group::Array => self.array_keyword(keyword, value),
                Group::String => self.string_keyword(keyword, value),
                Group::Numeric => self.numeric_keyword(keyword, value),
            };
        }

        if Combinators::owns(keyword) {
            return self.combinator_keyword(keyword, value);
        }

        if ANNOTATION_KEYWORDS.contains(&keyword) {
            self.common.extra.insert(keyword.to_string(), value.clone());
            return Ok(());
        }

        if UNSUPPORTED_KEYWORDS.contains(&keyword) {
            self.common
                .unsupported
                .insert(keyword.to_string(), value.clone());
            return Ok(());
        }

        if self.common_keyword(keyword, value)? {
            return Ok(());
        }

        match self.parser.options.unknown_keywords {
            UnknownKeywords::Reject => Err(self.invalid(keyword, "is not a recognized keyword")),
            UnknownKeywords::Preserve => {
                self.common.extra.insert(keyword.to_string(), value.clone());
                Ok(())
            }
        }
    }

    fn check_placement(&mut self, keyword: &str, group: Group) -> Result<(), InvalidSchema> {
        let Some(declared) = self.declared_type else {
            return Ok(());
        };
        if group.belongs_to(declared) {
            return Ok(());
        }
        match self.parser.options.placement {
            Placement::Strict => Err(self.invalid(
                keyword,
                format!("is not valid for type '{}'", declared),
            )),
            Placement::Lenient => {
                self.widened = true;
                Ok(())
            }
        }
    }

    /// Returns false if `keyword` is not a common keyword.
    fn common_keyword(&mut self, keyword: &str, value: &Value) -> Result<bool, InvalidSchema> {
        match keyword {
            "$schema" => {
                let uri = self.string(keyword, value)?;
                self.check_draft(&uri)?;
                self.common.schema_uri = Some(uri);
            }
            "$id" => self.common.id = Some(self.string(keyword, value)?),
            "$anchor" => self.common.anchor = Some(self.string(keyword, value)?),
            "$dynamicAnchor" => self.common.dynamic_anchor = Some(self.string(keyword, value)?),
            "$comment" => self.common.comment = Some(self.string(keyword, value)?),
            "$ref" => self.common.reference = Some(self.string(keyword, value)?),
            "title" => self.common.title = Some(self.string(keyword, value)?),
            "description" => self.common.description = Some(self.string(keyword, value)?),
            "default" => self.common.default = Some(value.clone()),
            "examples" => self.common.examples = Some(self.array(keyword, value)?.clone()),
            "deprecated" => self.common.deprecated = self.boolean(keyword, value)?,
            "readOnly" => self.common.read_only = self.boolean(keyword, value)?,
            "writeOnly" => self.common.write_only = self.boolean(keyword, value)?,
            "enum" => self.common.enum_values = Some(self.array(keyword, value)?.clone()),
            "const" => self.common.const_value = Some(value.clone()),
            "$defs" => self.common.defs = self.schema_map(keyword, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn check_draft(&self, uri: &str) -> Result<(), InvalidSchema> {
        if uri.strip_suffix('#').unwrap_or(uri) == DRAFT_2020_12 {
            return Ok(());
        }
        match self.parser.options.placement {
            Placement::Strict => Err(self.invalid(
                "$schema",
                format!("names '{}', only {} is supported", uri, DRAFT_2020_12),
            )),
            Placement::Lenient => {
                warn!(
                    pointer = %self.pointer,
                    draft = uri,
                    "evaluating schema for another draft with 2020-12 semantics"
                );
                Ok(())
            }
        }
    }

    fn combinator_keyword(&mut self, keyword: &str, value: &Value) -> Result<(), InvalidSchema> {
        match keyword {
            "allOf" => self.combinators.all_of = self.schema_list(keyword, value)?,
            "anyOf" => self.combinators.any_of = self.schema_list(keyword, value)?,
            "oneOf" => self.combinators.one_of = self.schema_list(keyword, value)?,
            "not" => self.combinators.not = Some(self.schema(keyword, value)?),
            "if" => self.combinators.if_schema = Some(self.schema(keyword, value)?),
            "then" => self.combinators.then_schema = Some(self.schema(keyword, value)?),
            "else" => self.combinators.else_schema = Some(self.schema(keyword, value)?),
            _ => return Err(self.invalid(keyword, "is not a combinator")),
        }
        Ok(())
    }

    fn object_keyword(&mut self, keyword: &str, value: &Value) -> Result<(), InvalidSchema> {
        match keyword {
            "properties" => self.object.properties = self.schema_map(keyword, value)?,
            "patternProperties" => {
                let members = self.object_value(keyword, value)?;
                let mut entries = Vec::with_capacity(members.len());
                for (source, member) in members {
                    let pattern = self.pattern(keyword, source)?;
                    let pointer = self.pointer.push_field(keyword).push_field(source);
                    let schema = self.parser.subschema(member, self.pointer, keyword, pointer)?;
                    entries.push(PatternProperty { pattern, schema });
                }
                self.object.pattern_properties = entries;
            }
            "additionalProperties" => {
                self.object.additional_properties = Some(self.schema(keyword, value)?)
            }
            "required" => self.object.required = self.string_set(keyword, value)?,
            "propertyNames" => self.object.property_names = Some(self.schema(keyword, value)?),
            "minProperties" => self.object.min_properties = Some(self.non_negative(keyword, value)?),
            "maxProperties" => self.object.max_properties = Some(self.non_negative(keyword, value)?),
            "dependentRequired" => {
                let members = self.object_value(keyword, value)?;
                let mut dependents = IndexMap::with_capacity(members.len());
                for (trigger, names) in members {
                    dependents.insert(trigger.clone(), self.string_set(keyword, names)?);
                }
                self.object.dependent_required = dependents;
            }
            "dependentSchemas" => self.object.dependent_schemas = self.schema_map(keyword, value)?,
            _ => return Err(self.invalid(keyword, "is not an object keyword")),
        }
        Ok(())
    }

    fn array_keyword(&mut self, keyword: &str, value: &Value) -> Result<(), InvalidSchema> {
        match keyword {
            "prefixItems" => self.array.prefix_items = self.schema_list(keyword, value)?,
            "items" => {
                if value.as_array().is_some() {
                    return Err(self.invalid(
                        keyword,
                        "must be a single schema; use prefixItems for positional items",
                    ));
                }
                self.array.items = Some(self.schema(keyword, value)?);
            }
            "contains" => self.array.contains = Some(self.schema(keyword, value)?),
            "minContains" => self.array.min_contains = Some(self.non_negative(keyword, value)?),
            "maxContains" => self.array.max_contains = Some(self.non_negative(keyword, value)?),
            "minItems" => self.array.min_items = Some(self.non_negative(keyword, value)?),
            "maxItems" => self.array.max_items = Some(self.non_negative(keyword, value)?),
            "uniqueItems" => self.array.unique_items = self.boolean(keyword, value)?,
            _ => return Err(self.invalid(keyword, "is not an array keyword")),
        }
        Ok(())
    }

    fn string_keyword(&mut self, keyword: &str, value: &Value) -> Result<(), InvalidSchema> {
        match keyword {
            "minLength" => self.string.min_length = Some(self.non_negative(keyword, value)?),
            "maxLength" => self.string.max_length = Some(self.non_negative(keyword, value)?),
            "pattern" => {
                let source = self.string(keyword, value)?;
                self.string.pattern = Some(self.pattern(keyword, &source)?);
            }
            "format" => {
                let name = self.string(keyword, value)?;
                if !KNOWN_FORMATS.contains(&name.as_str()) {
                    debug!(pointer = %self.pointer, format = %name, "format is annotation only");
                }
                self.string.format = Some(name);
            }
            _ => return Err(self.invalid(keyword, "is not a string keyword")),
        }
        Ok(())
    }

    fn numeric_keyword(&mut self, keyword: &str, value: &Value) -> Result<(), InvalidSchema> {
        let n = self.number(keyword, value)?;
        match keyword {
            "minimum" => self.numeric.minimum = Some(n),
            "maximum" => self.numeric.maximum = Some(n),
            "exclusiveMinimum" => self.numeric.exclusive_minimum = Some(n),
            "exclusiveMaximum" => self.numeric.exclusive_maximum = Some(n),
            "multipleOf" => {
                if n.as_f64().partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater) {
                    return Err(self.invalid(keyword, format!("must be greater than 0, got {}", n)));
                }
                self.numeric.multiple_of = Some(n);
            }
            _ => return Err(self.invalid(keyword, "is not a numeric keyword")),
        }
        Ok(())
    }

    fn finish(self, declared: Vec<InstanceType>) -> SchemaNode {
        let kind = match (self.declared_type, self.widened) {
            (Some(InstanceType::Object), false) => NodeKind::Object(self.object),
            (Some(InstanceType::Array), false) => NodeKind::Array(self.array),
            (Some(InstanceType::String), false) => NodeKind::String(self.string),
            (Some(InstanceType::Integer), false) => NodeKind::Integer(self.numeric),
            (Some(InstanceType::Number), false) => NodeKind::Number(self.numeric),
            (Some(InstanceType::Boolean), false) => NodeKind::Boolean,
            (Some(InstanceType::Null), false) => NodeKind::Null,
            _ => NodeKind::Any(AnyKeywords {
                types: declared,
                object: self.object,
                array: self.array,
                string: self.string,
                numeric: self.numeric,
            }),
        };
        SchemaNode {
            kind,
            common: self.common,
            combinators: self.combinators,
        }
    }

    // keyword value readers

    fn string(&self, keyword: &str, value: &Value) -> Result<String, InvalidSchema> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(keyword, format!("must be a string, got {}", value.kind_name())))
    }

    fn boolean(&self, keyword: &str, value: &Value) -> Result<bool, InvalidSchema> {
        value
            .as_bool()
            .ok_or_else(|| self.invalid(keyword, format!("must be a boolean, got {}", value.kind_name())))
    }

    fn number(&self, keyword: &str, value: &Value) -> Result<Number, InvalidSchema> {
        value
            .as_number()
            .copied()
            .ok_or_else(|| self.invalid(keyword, format!("must be a number, got {}", value.kind_name())))
    }

    fn non_negative(&self, keyword: &str, value: &Value) -> Result<u64, InvalidSchema> {
        let n = self.number(keyword, value)?;
        match n.as_i64() {
            Some(i) if i >= 0 && n.is_whole() => Ok(i as u64),
            _ => Err(self.invalid(
                keyword,
                format!("must be a non-negative integer, got {}", n),
            )),
        }
    }

    fn array<'v>(&self, keyword: &str, value: &'v Value) -> Result<&'v Vec<Value>, InvalidSchema> {
        value
            .as_array()
            .ok_or_else(|| self.invalid(keyword, format!("must be an array, got {}", value.kind_name())))
    }

    fn object_value<'v>(&self, keyword: &str, value: &'v Value) -> Result<&'v Map, InvalidSchema> {
        value
            .as_object()
            .ok_or_else(|| self.invalid(keyword, format!("must be an object, got {}", value.kind_name())))
    }

    fn string_set(&self, keyword: &str, value: &Value) -> Result<IndexSet<String>, InvalidSchema> {
        let mut set = IndexSet::new();
        for item in self.array(keyword, value)? {
            let name = item
                .as_str()
                .ok_or_else(|| self.invalid(keyword, "must contain only strings"))?;
            if !set.insert(name.to_string()) {
                return Err(self.invalid(keyword, format!("lists '{}' more than once", name)));
            }
        }
        Ok(set)
    }

    fn pattern(&self, keyword: &str, source: &str) -> Result<Pattern, InvalidSchema> {
        Pattern::new(source)
            .map_err(|e| self.invalid(keyword, format!("has invalid regex '{}': {}", source, e)))
    }

    fn schema(&self, keyword: &str, value: &Value) -> Result<Arc<Schema>, InvalidSchema> {
        self.parser
            .subschema(value, self.pointer, keyword, self.pointer.push_field(keyword))
    }

    fn schema_list(&self, keyword: &str, value: &Value) -> Result<Vec<Arc<Schema>>, InvalidSchema> {
        let items = self.array(keyword, value)?;
        if items.is_empty() {
            return Err(self.invalid(keyword, "must not be an empty array"));
        }
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let pointer = self.pointer.push_field(keyword).push_index(i);
                self.parser.subschema(item, self.pointer, keyword, pointer)
            })
            .collect()
    }

    fn schema_map(
        &self,
        keyword: &str,
        value: &Value,
    ) -> Result<IndexMap<String, Arc<Schema>>, InvalidSchema> {
        let members = self.object_value(keyword, value)?;
        let mut out = IndexMap::with_capacity(members.len());
        for (name, member) in members {
            let pointer = self.pointer.push_field(keyword).push_field(name);
            out.insert(
                name.clone(),
                self.parser.subschema(member, self.pointer, keyword, pointer)?,
            );
        }
        Ok(out)
    }
}
