//! Object keywords.
//!
//! This module provides [`ObjectKeywords`] for validating JSON objects:
//! declared and pattern-matched properties, additional property handling,
//! required and dependent keys, property name constraints and size bounds.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::error::{EvaluationError, ValidationError};
use crate::path::PathSegment;
use crate::validator::{Location, ValidationContext};
use crate::value::Value;

use super::string::Pattern;
use super::traits::{seg, seg2, KeywordGroup};
use super::Schema;

/// A `patternProperties` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternProperty {
    /// The compiled key pattern.
    pub pattern: Pattern,
    /// Schema applied to values whose key matches.
    pub schema: Arc<Schema>,
}

/// Keywords that constrain object values.
///
/// All property failures are accumulated rather than short-circuiting on the
/// first one.
///
/// # Example
///
/// ```rust
/// use schemata::{Document, NumericKeywords, ObjectKeywords, SchemaNode, StringKeywords};
/// use serde_json::json;
///
/// let person = ObjectKeywords::new()
///     .field("name", StringKeywords::new().min_len(1))
///     .field("age", SchemaNode::integer(NumericKeywords::new().non_negative()))
///     .optional("email", StringKeywords::new().format("email"))
///     .additional_properties(false);
///
/// let doc = Document::new(person.into()).unwrap();
/// assert!(doc.is_valid(&json!({"name": "Alice", "age": 30}).into()).unwrap());
/// assert!(!doc.is_valid(&json!({"name": "Alice", "age": 30, "x": 1}).into()).unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectKeywords {
    /// `properties`
    pub properties: IndexMap<String, Arc<Schema>>,
    /// `patternProperties`
    pub pattern_properties: Vec<PatternProperty>,
    /// `additionalProperties`
    pub additional_properties: Option<Arc<Schema>>,
    /// `required`
    pub required: IndexSet<String>,
    /// `propertyNames`
    pub property_names: Option<Arc<Schema>>,
    /// `minProperties`
    pub min_properties: Option<u64>,
    /// `maxProperties`
    pub max_properties: Option<u64>,
    /// `dependentRequired`
    pub dependent_required: IndexMap<String, IndexSet<String>>,
    /// `dependentSchemas`
    pub dependent_schemas: IndexMap<String, Arc<Schema>>,
}

impl ObjectKeywords {
    /// Creates an empty keyword set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a required property.
    pub fn field(self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        let name = name.into();
        self.optional(name.clone(), schema).require(name)
    }

    /// Declares a property without requiring it.
    pub fn optional(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.properties.insert(name.into(), Arc::new(schema.into()));
        self
    }

    /// Adds a name to `required`.
    pub fn require(mut self, name: impl Into<String>) -> Self {
        self.required.insert(name.into());
        self
    }

    /// Adds a `patternProperties` entry, failing if the pattern does not compile.
    pub fn pattern_property(
        mut self,
        pattern: &str,
        schema: impl Into<Schema>,
    ) -> Result<Self, regex::Error> {
        self.pattern_properties.push(PatternProperty {
            pattern: Pattern::new(pattern)?,
            schema: Arc::new(schema.into()),
        });
        Ok(self)
    }

    /// Sets `additionalProperties`; `false` forbids undeclared keys.
    pub fn additional_properties(mut self, schema: impl Into<Schema>) -> Self {
        self.additional_properties = Some(Arc::new(schema.into()));
        self
    }

    /// Sets `propertyNames`.
    pub fn property_names(mut self, schema: impl Into<Schema>) -> Self {
        self.property_names = Some(Arc::new(schema.into()));
        self
    }

    /// Sets `minProperties`.
    pub fn min_properties(mut self, min: u64) -> Self {
        self.min_properties = Some(min);
        self
    }

    /// Sets `maxProperties`.
    pub fn max_properties(mut self, max: u64) -> Self {
        self.max_properties = Some(max);
        self
    }

    /// Adds a `dependentRequired` entry: if `trigger` is present, so must be `names`.
    pub fn dependent_required<I, S>(mut self, trigger: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependent_required
            .insert(trigger.into(), names.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a `dependentSchemas` entry applied to the whole object when `trigger` is present.
    pub fn dependent_schema(mut self, trigger: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.dependent_schemas
            .insert(trigger.into(), Arc::new(schema.into()));
        self
    }

    fn is_declared(&self, key: &str) -> bool {
        self.properties.contains_key(key)
            || self.pattern_properties.iter().any(|p| p.pattern.is_match(key))
    }
}

impl KeywordGroup for ObjectKeywords {
    const KEYWORDS: &'static [&'static str] = &[
        "properties",
        "patternProperties",
        "additionalProperties",
        "required",
        "propertyNames",
        "minProperties",
        "maxProperties",
        "dependentRequired",
        "dependentSchemas",
    ];

    fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.pattern_properties.is_empty()
            && self.additional_properties.is_none()
            && self.required.is_empty()
            && self.property_names.is_none()
            && self.min_properties.is_none()
            && self.max_properties.is_none()
            && self.dependent_required.is_empty()
            && self.dependent_schemas.is_empty()
    }

    fn subschemas(&self) -> Vec<(Vec<PathSegment>, &Arc<Schema>)> {
        let mut out = Vec::new();
        for (name, schema) in &self.properties {
            out.push((seg2("properties", PathSegment::field(name)), schema));
        }
        for entry in &self.pattern_properties {
            out.push((
                seg2("patternProperties", PathSegment::field(entry.pattern.as_str())),
                &entry.schema,
            ));
        }
        if let Some(schema) = &self.additional_properties {
            out.push((seg("additionalProperties"), schema));
        }
        if let Some(schema) = &self.property_names {
            out.push((seg("propertyNames"), schema));
        }
        for (name, schema) in &self.dependent_schemas {
            out.push((seg2("dependentSchemas", PathSegment::field(name)), schema));
        }
        out
    }

    fn evaluate(
        &self,
        value: &Value,
        at: &Location,
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationError>, EvaluationError> {
        let Some(object) = value.as_object() else {
            return Ok(Vec::new());
        };

        let mut errors = Vec::new();
        let count = object.len() as u64;

        if let Some(min) = self.min_properties {
            if count < min {
                errors.push(
                    at.error(
                        "minProperties",
                        format!("object must have at least {} properties, got {}", min, count),
                    )
                    .with_expected(format!(">= {} properties", min))
                    .with_got(count.to_string()),
                );
            }
        }
        if let Some(max) = self.max_properties {
            if count > max {
                errors.push(
                    at.error(
                        "maxProperties",
                        format!("object must have at most {} properties, got {}", max, count),
                    )
                    .with_expected(format!("<= {} properties", max))
                    .with_got(count.to_string()),
                );
            }
        }

        for name in &self.required {
            if !object.contains_key(name) {
                errors.push(
                    at.error("required", format!("required property '{}' is missing", name))
                        .with_expected(name.clone()),
                );
            }
        }

        for (name, schema) in &self.properties {
            if let Some(member) = object.get(name) {
                let sub = at
                    .keyword_member("properties", PathSegment::field(name))
                    .item(PathSegment::field(name));
                ctx.evaluate_into(schema, member, &sub, &mut errors)?;
            }
        }

        for entry in &self.pattern_properties {
            for (key, member) in object {
                if entry.pattern.is_match(key) {
                    let sub = at
                        .keyword_member(
                            "patternProperties",
                            PathSegment::field(entry.pattern.as_str()),
                        )
                        .item(PathSegment::field(key));
                    ctx.evaluate_into(&entry.schema, member, &sub, &mut errors)?;
                }
            }
        }

        if let Some(additional) = &self.additional_properties {
            for (key, member) in object {
                if self.is_declared(key) {
                    continue;
                }
                if matches!(additional.as_ref(), Schema::Bool(false)) {
                    errors.push(
                        at.keyword("additionalProperties")
                            .item(PathSegment::field(key))
                            .error(
                                "additionalProperties",
                                format!("additional property '{}' is not allowed", key),
                            )
                            .with_code("additional_property"),
                    );
                    continue;
                }
                let sub = at
                    .keyword("additionalProperties")
                    .item(PathSegment::field(key));
                ctx.evaluate_into(additional, member, &sub, &mut errors)?;
            }
        }

        if let Some(names) = &self.property_names {
            for key in object.keys() {
                let sub = at.keyword("propertyNames").item(PathSegment::field(key));
                ctx.evaluate_into(names, &Value::String(key.clone()), &sub, &mut errors)?;
            }
        }

        for (trigger, dependents) in &self.dependent_required {
            if !object.contains_key(trigger) {
                continue;
            }
            for name in dependents {
                if !object.contains_key(name) {
                    errors.push(
                        at.error(
                            "dependentRequired",
                            format!("property '{}' is required when '{}' is present", name, trigger),
                        )
                        .with_expected(name.clone()),
                    );
                }
            }
        }

        for (trigger, schema) in &self.dependent_schemas {
            if object.contains_key(trigger) {
                let sub = at.keyword_member("dependentSchemas", PathSegment::field(trigger));
                ctx.evaluate_into(schema, value, &sub, &mut errors)?;
            }
        }

        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DocumentIndex;
    use crate::schema::{SchemaNode, StringKeywords};
    use crate::validator::ValidationOptions;
    use serde_json::json;

    fn run(keywords: &ObjectKeywords, value: serde_json::Value) -> Vec<ValidationError> {
        let index = DocumentIndex::empty();
        let options = ValidationOptions::default();
        let ctx = ValidationContext::new(&index, &options);
        keywords
            .evaluate(&Value::from(value), &Location::root(), &ctx)
            .expect("no references involved")
    }

    #[test]
    fn test_required_reports_at_object() {
        let k = ObjectKeywords::new().field("name", StringKeywords::new());
        let errors = run(&k, json!({}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].keyword, "required");
        assert!(errors[0].instance_path.is_root());
    }

    #[test]
    fn test_property_errors_carry_paths() {
        let k = ObjectKeywords::new().field("name", StringKeywords::new().min_len(3));
        let errors = run(&k, json!({"name": "al"}));
        assert_eq!(errors[0].instance_path.to_string(), "#/name");
        assert_eq!(errors[0].schema_path.to_string(), "#/properties/name");
    }

    #[test]
    fn test_additional_properties_false() {
        let k = ObjectKeywords::new()
            .optional("a", true)
            .pattern_property("^x-", true)
            .unwrap()
            .additional_properties(false);
        assert!(run(&k, json!({"a": 1, "x-y": 2})).is_empty());

        let errors = run(&k, json!({"a": 1, "b": 2}));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "additional_property");
        assert_eq!(errors[0].instance_path.to_string(), "#/b");
        assert_eq!(errors[0].schema_path.to_string(), "#/additionalProperties");
    }

    #[test]
    fn test_additional_properties_schema() {
        let k = ObjectKeywords::new()
            .additional_properties(SchemaNode::boolean());
        assert!(run(&k, json!({"a": true})).is_empty());
        assert_eq!(run(&k, json!({"a": 1}))[0].keyword, "type");
    }

    #[test]
    fn test_property_names() {
        let k = ObjectKeywords::new().property_names(StringKeywords::new().max_len(3));
        assert!(run(&k, json!({"abc": 1})).is_empty());
        let errors = run(&k, json!({"abcd": 1}));
        assert_eq!(errors[0].keyword, "maxLength");
        assert_eq!(errors[0].instance_path.to_string(), "#/abcd");
    }

    #[test]
    fn test_dependent_required() {
        let k = ObjectKeywords::new().dependent_required("credit_card", ["billing_address"]);
        assert!(run(&k, json!({})).is_empty());
        assert!(run(&k, json!({"billing_address": "x"})).is_empty());
        assert_eq!(
            run(&k, json!({"credit_card": 1}))[0].keyword,
            "dependentRequired"
        );
    }

    #[test]
    fn test_dependent_schemas_apply_to_whole_object() {
        let k = ObjectKeywords::new()
            .dependent_schema("bar", ObjectKeywords::new().require("foo"));
        assert!(run(&k, json!({"foo": 1, "bar": 2})).is_empty());
        assert_eq!(run(&k, json!({"bar": 2}))[0].keyword, "required");
    }

    #[test]
    fn test_size_bounds() {
        let k = ObjectKeywords::new().min_properties(1).max_properties(2);
        assert_eq!(run(&k, json!({}))[0].keyword, "minProperties");
        assert!(run(&k, json!({"a": 1})).is_empty());
        assert_eq!(run(&k, json!({"a": 1, "b": 2, "c": 3}))[0].keyword, "maxProperties");
    }

    #[test]
    fn test_non_objects_are_ignored() {
        let k = ObjectKeywords::new().require("a");
        assert!(run(&k, json!([1])).is_empty());
    }

    #[test]
    fn test_error_accumulation() {
        let k = ObjectKeywords::new()
            .field("a", StringKeywords::new())
            .field("b", StringKeywords::new())
            .field("c", StringKeywords::new());
        let errors = run(&k, json!({"a": 1}));
        assert_eq!(errors.len(), 3);
    }
}
