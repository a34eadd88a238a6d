//! Schema evaluation.
//!
//! This module provides the [`Validator`] entry point, its [`ValidationOptions`],
//! and the [`ValidationContext`] threaded through every keyword check. The
//! context carries the document index for `$ref` resolution and tracks
//! reference depth so that cycles terminate.
//!
//! # Evaluation order
//!
//! For a schema object the checks run as: unsupported keywords (fatal),
//! `const`, `enum`, the type check, the type-specific keywords (skipped when
//! the type check fails), the combinators, then `$ref`. All failures are
//! accumulated; only [`EvaluationError`]s stop evaluation.

use stillwater::Validation;

use crate::document::Document;
use crate::error::{finish, Error, EvaluationError, ValidationError, ValidationFailure};
use crate::index::DocumentIndex;
use crate::path::{JsonPointer, PathSegment};
use crate::schema::{reference, KeywordGroup, Schema};
use crate::value::Value;
use crate::ValidationResult;

/// Default ceiling on nested `$ref` evaluation.
///
/// Every `$ref` hop counts, including hops that also descend into the
/// instance. A recursive schema such as `Person.father` spends one hop per
/// level of nesting, so the ceiling sits above the 128-level nesting limit of
/// `serde_json`: any instance it can decode fits. Evaluation recurses on the
/// native stack, which is what the ceiling bounds.
pub const DEFAULT_MAX_DEPTH: usize = 200;

/// Options that tune evaluation.
///
/// # Example
///
/// ```rust
/// use schemata::ValidationOptions;
///
/// let options = ValidationOptions::default()
///     .with_max_depth(20)
///     .with_format_assertion(false);
///
/// assert_eq!(options.max_depth(), 20);
/// assert!(!options.format_assertion());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    max_depth: usize,
    format_assertion: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            format_assertion: true,
        }
    }
}

impl ValidationOptions {
    /// Sets the maximum `$ref` depth.
    ///
    /// Following a reference at this depth fails with
    /// [`EvaluationError::RecursionLimitExceeded`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables or disables `format` assertion for the recognized formats.
    pub fn with_format_assertion(mut self, enabled: bool) -> Self {
        self.format_assertion = enabled;
        self
    }

    /// Returns the maximum `$ref` depth.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns true if `format` is asserted.
    pub fn format_assertion(&self) -> bool {
        self.format_assertion
    }
}

/// A pair of schema and instance locations.
///
/// The schema pointer addresses the node being evaluated; the instance
/// pointer addresses the value it is evaluated against.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Location {
    schema: JsonPointer,
    instance: JsonPointer,
}

impl Location {
    /// The root of both the schema and the instance.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a location.
    pub fn new(schema: JsonPointer, instance: JsonPointer) -> Self {
        Self { schema, instance }
    }

    /// Returns the schema pointer.
    pub fn schema(&self) -> &JsonPointer {
        &self.schema
    }

    /// Returns the instance pointer.
    pub fn instance(&self) -> &JsonPointer {
        &self.instance
    }

    /// Descends into the subschema under `keyword`.
    pub(crate) fn keyword(&self, keyword: &str) -> Location {
        Location {
            schema: self.schema.push_field(keyword),
            instance: self.instance.clone(),
        }
    }

    /// Descends into a member of a keyword (`properties/<name>`, `allOf/<i>`).
    pub(crate) fn keyword_member(&self, keyword: &str, member: PathSegment) -> Location {
        Location {
            schema: self.schema.join(&[PathSegment::field(keyword), member]),
            instance: self.instance.clone(),
        }
    }

    /// Descends into a member of the instance.
    pub(crate) fn item(&self, segment: PathSegment) -> Location {
        Location {
            schema: self.schema.clone(),
            instance: self.instance.push(segment),
        }
    }

    /// Creates an error for `keyword` at this location.
    pub(crate) fn error(&self, keyword: &str, message: impl Into<String>) -> ValidationError {
        ValidationError::new(
            self.schema.clone(),
            self.instance.clone(),
            keyword,
            message,
        )
    }
}

/// State threaded through a single validation call.
///
/// The context is cheap to copy: it borrows the index and options and only
/// owns the current reference depth.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    index: &'a DocumentIndex,
    options: &'a ValidationOptions,
    depth: usize,
}

impl<'a> ValidationContext<'a> {
    /// Creates a context at depth zero.
    pub fn new(index: &'a DocumentIndex, options: &'a ValidationOptions) -> Self {
        Self {
            index,
            options,
            depth: 0,
        }
    }

    /// Creates a new context with incremented depth.
    ///
    /// This is called when following a `$ref` to track the length of the
    /// reference chain.
    pub fn increment_depth(&self) -> Self {
        Self {
            depth: self.depth + 1,
            ..*self
        }
    }

    /// Returns the current depth of reference traversal.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the maximum allowed depth.
    pub fn max_depth(&self) -> usize {
        self.options.max_depth
    }

    /// Returns the index used to resolve references.
    pub fn index(&self) -> &'a DocumentIndex {
        self.index
    }

    /// Returns true if `format` keywords are asserted.
    pub fn asserts_formats(&self) -> bool {
        self.options.format_assertion
    }

    /// Evaluates `schema` against `value`.
    pub fn evaluate(
        &self,
        schema: &Schema,
        value: &Value,
        at: &Location,
    ) -> Result<ValidationResult<()>, EvaluationError> {
        let node = match schema {
            Schema::Bool(true) => return Ok(Validation::Success(())),
            Schema::Bool(false) => {
                return Ok(Validation::Failure(ValidationFailure::single(
                    at.error("false", "no value is valid against the false schema"),
                )))
            }
            Schema::Node(node) => node,
        };

        if let Some(feature) = node.common.unsupported.keys().next() {
            return Err(EvaluationError::NotYetImplemented {
                feature: feature.clone(),
                location: at.schema.clone(),
            });
        }

        let mut errors = Vec::new();

        if let Some(expected) = &node.common.const_value {
            if value != expected {
                errors.push(
                    at.error("const", "value does not equal the constant")
                        .with_expected(expected.to_json_string())
                        .with_got(value.to_json_string()),
                );
            }
        }

        if let Some(allowed) = &node.common.enum_values {
            if !allowed.contains(value) {
                errors.push(
                    at.error("enum", "value is not one of the allowed values")
                        .with_expected(Value::Array(allowed.clone()).to_json_string())
                        .with_got(value.to_json_string()),
                );
            }
        }

        if node.kind.accepts(value) {
            errors.extend(node.kind.evaluate(value, at, self)?);
        } else {
            let expected = node
                .kind
                .allowed_types()
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(" or ");
            errors.push(
                at.error("type", format!("expected {}, got {}", expected, value.kind_name()))
                    .with_code("invalid_type")
                    .with_expected(expected)
                    .with_got(value.kind_name()),
            );
        }

        errors.extend(node.combinators.evaluate(value, at, self)?);

        if let Some(target) = &node.common.reference {
            errors.extend(reference::follow(target, value, at, self)?);
        }

        Ok(finish(errors))
    }

    /// Evaluates `schema` and appends any failures to `errors`.
    pub(crate) fn evaluate_into(
        &self,
        schema: &Schema,
        value: &Value,
        at: &Location,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), EvaluationError> {
        if let Validation::Failure(failure) = self.evaluate(schema, value, at)? {
            errors.extend(failure);
        }
        Ok(())
    }
}

/// Validates instances against a [`Document`].
///
/// # Example
///
/// ```rust
/// use schemata::{Document, Validator};
/// use serde_json::json;
///
/// let doc = Document::from_json(&json!({
///     "type": "object",
///     "properties": {"name": {"type": "string"}},
///     "required": ["name"]
/// }).into()).unwrap();
///
/// let validator = Validator::new(&doc).with_max_depth(10);
/// assert!(validator.is_valid(&json!({"name": "a"}).into()).unwrap());
///
/// let failure = match validator.validate(&json!({}).into()).unwrap() {
///     stillwater::Validation::Failure(f) => f,
///     stillwater::Validation::Success(_) => panic!("expected failure"),
/// };
/// assert_eq!(failure.first().keyword, "required");
/// assert_eq!(failure.first().instance_path.to_string(), "#");
/// ```
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    document: &'a Document,
    options: ValidationOptions,
}

impl<'a> Validator<'a> {
    /// Creates a validator with default options.
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            options: ValidationOptions::default(),
        }
    }

    /// Replaces all options.
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the maximum `$ref` depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.options = self.options.with_max_depth(max_depth);
        self
    }

    /// Enables or disables `format` assertion.
    pub fn with_format_assertion(mut self, enabled: bool) -> Self {
        self.options = self.options.with_format_assertion(enabled);
        self
    }

    /// Returns the options in use.
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Validates `value` against the document root.
    pub fn validate(&self, value: &Value) -> Result<ValidationResult<()>, EvaluationError> {
        let ctx = ValidationContext::new(self.document.index(), &self.options);
        ctx.evaluate(self.document.root(), value, &Location::root())
    }

    /// Validates `value` against the subschema at `pointer` (e.g. `#/$defs/Person`).
    pub fn validate_at(
        &self,
        pointer: &JsonPointer,
        value: &Value,
    ) -> Result<ValidationResult<()>, EvaluationError> {
        let entry = self.document.index().get(pointer).ok_or_else(|| {
            EvaluationError::UnresolvableReference {
                reference: pointer.to_string(),
                location: JsonPointer::root(),
            }
        })?;
        let ctx = ValidationContext::new(self.document.index(), &self.options);
        ctx.evaluate(
            &entry.schema,
            value,
            &Location::new(entry.pointer.clone(), JsonPointer::root()),
        )
    }

    /// Returns true if `value` is valid.
    pub fn is_valid(&self, value: &Value) -> Result<bool, EvaluationError> {
        Ok(self.validate(value)?.is_success())
    }

    /// Succeeds silently for a valid value and fails with
    /// [`Error::InvalidValue`] otherwise.
    pub fn assert_valid(&self, value: &Value) -> Result<(), Error> {
        self.validate(value)?.into_result().map_err(Error::from)
    }
}
