//! Validation failure types.
//!
//! This module provides [`ValidationError`] for a single violated keyword and
//! [`ValidationFailure`] for the non-empty set of violations an instance produced.

use std::fmt::{self, Display};

use stillwater::prelude::*;
use stillwater::Validation;

use crate::path::JsonPointer;

/// A single violated keyword with full context.
///
/// `ValidationError` captures all relevant information about a failure:
/// - **schema_path**: location of the schema node whose keyword failed
/// - **instance_path**: location of the instance value that failed
/// - **keyword**: the violated keyword (`required`, `minLength`, ...)
/// - **code**: machine-readable code, defaulting to the keyword; combinators use
///   it to separate outcomes such as `one_of_none_matched` and
///   `one_of_multiple_matched`
/// - **message**: human-readable description
/// - **got** / **expected**: optional detail
///
/// # Example
///
/// ```rust
/// use schemata::{JsonPointer, ValidationError};
///
/// let error = ValidationError::new(
///     JsonPointer::root(),
///     JsonPointer::root().push_field("email"),
///     "format",
///     "invalid email format",
/// )
/// .with_got("not-an-email")
/// .with_expected("email address");
///
/// assert_eq!(error.keyword, "format");
/// assert_eq!(error.code, "format");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Location of the schema node that owns the violated keyword.
    pub schema_path: JsonPointer,
    /// Location of the instance value that failed validation.
    pub instance_path: JsonPointer,
    /// The violated keyword.
    pub keyword: String,
    /// Machine-readable error code (e.g., `one_of_multiple_matched`).
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// The actual value that was received (formatted as string).
    pub got: Option<String>,
    /// Description of what was expected.
    pub expected: Option<String>,
}

impl ValidationError {
    /// Creates a new error; the code defaults to the keyword name.
    pub fn new(
        schema_path: JsonPointer,
        instance_path: JsonPointer,
        keyword: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let keyword = keyword.into();
        Self {
            schema_path,
            instance_path,
            code: keyword.clone(),
            keyword,
            message: message.into(),
            got: None,
            expected: None,
        }
    }

    /// Sets the error code and returns self for chaining.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Sets the "got" (actual value) field and returns self for chaining.
    pub fn with_got(mut self, got: impl Into<String>) -> Self {
        self.got = Some(got.into());
        self
    }

    /// Sets the "expected" field and returns self for chaining.
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{} at {}]",
            self.instance_path, self.message, self.keyword, self.schema_path
        )?;

        if let Some(ref expected) = self.expected {
            write!(f, " (expected: {})", expected)?;
        }
        if let Some(ref got) = self.got {
            write!(f, " (got: {})", got)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ValidationError>();
    assert_sync::<ValidationError>();
};

/// A non-empty collection of validation errors.
///
/// `ValidationFailure` wraps a `NonEmptyVec<ValidationError>` so a failed
/// validation always explains itself. It implements `Semigroup`, which lets the
/// validator merge failures from sibling keywords and subschemas:
///
/// ```rust
/// use schemata::{JsonPointer, ValidationError, ValidationFailure};
/// use stillwater::prelude::*;
///
/// let root = JsonPointer::root();
/// let a = ValidationFailure::single(
///     ValidationError::new(root.clone(), root.clone(), "required", "missing 'name'"),
/// );
/// let b = ValidationFailure::single(
///     ValidationError::new(root.clone(), root.push_field("age"), "minimum", "too small"),
/// );
///
/// assert_eq!(a.combine(b).len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure(NonEmptyVec<ValidationError>);

impl ValidationFailure {
    /// Creates a failure containing a single error.
    pub fn single(error: ValidationError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Creates a failure from a `NonEmptyVec` of errors.
    pub fn from_non_empty(errors: NonEmptyVec<ValidationError>) -> Self {
        Self(errors)
    }

    /// Creates a failure from a `Vec`, or returns `None` if the vec is empty.
    pub fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        let mut errors = errors.into_iter();
        let head = NonEmptyVec::singleton(errors.next()?);
        Some(Self(errors.fold(head, |acc, e| {
            acc.combine(NonEmptyVec::singleton(e))
        })))
    }

    /// Returns the number of errors in this collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the collection is guaranteed non-empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the contained errors.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Returns all errors reported for the given instance location.
    pub fn at_instance_path(&self, path: &JsonPointer) -> Vec<&ValidationError> {
        self.0.iter().filter(|e| &e.instance_path == path).collect()
    }

    /// Returns all errors for the given violated keyword.
    pub fn with_keyword(&self, keyword: &str) -> Vec<&ValidationError> {
        self.0.iter().filter(|e| e.keyword == keyword).collect()
    }

    /// Returns all errors with the given code.
    pub fn with_code(&self, code: &str) -> Vec<&ValidationError> {
        self.0.iter().filter(|e| e.code == code).collect()
    }

    /// Returns the first error in the collection.
    pub fn first(&self) -> &ValidationError {
        self.0.head()
    }

    /// Converts this collection into a `Vec<ValidationError>`.
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.0.into_vec()
    }

    /// Returns a reference to the underlying `NonEmptyVec`.
    pub fn as_non_empty_vec(&self) -> &NonEmptyVec<ValidationError> {
        &self.0
    }
}

impl Semigroup for ValidationFailure {
    fn combine(self, other: Self) -> Self {
        ValidationFailure(self.0.combine(other.0))
    }
}

impl Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} error(s):", self.len())?;
        for (i, error) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

impl IntoIterator for ValidationFailure {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationFailure {
    type Item = &'a ValidationError;
    type IntoIter = Box<dyn Iterator<Item = &'a ValidationError> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.0.iter())
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ValidationFailure>();
    assert_sync::<ValidationFailure>();
};

/// Turns collected errors into a validation outcome.
pub(crate) fn finish(errors: Vec<ValidationError>) -> Validation<(), ValidationFailure> {
    match ValidationFailure::from_vec(errors) {
        Some(failure) => Validation::Failure(failure),
        None => Validation::Success(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(instance: JsonPointer, keyword: &str, message: &str) -> ValidationError {
        ValidationError::new(JsonPointer::root(), instance, keyword, message)
    }

    #[test]
    fn test_validation_error_creation() {
        let e = error(JsonPointer::root().push_field("name"), "required", "missing");

        assert_eq!(e.instance_path, JsonPointer::root().push_field("name"));
        assert_eq!(e.keyword, "required");
        assert_eq!(e.code, "required");
        assert!(e.got.is_none());
        assert!(e.expected.is_none());
    }

    #[test]
    fn test_validation_error_builder() {
        let e = error(JsonPointer::root(), "oneOf", "matched two")
            .with_code("one_of_multiple_matched")
            .with_got("2 matches")
            .with_expected("exactly one");

        assert_eq!(e.keyword, "oneOf");
        assert_eq!(e.code, "one_of_multiple_matched");
        assert_eq!(e.got, Some("2 matches".to_string()));
        assert_eq!(e.expected, Some("exactly one".to_string()));
    }

    #[test]
    fn test_validation_error_display() {
        let e = ValidationError::new(
            JsonPointer::root().push_field("properties").push_field("email"),
            JsonPointer::root().push_field("email"),
            "format",
            "invalid format",
        )
        .with_expected("email address")
        .with_got("not-an-email");

        let display = e.to_string();
        assert!(display.contains("#/email: invalid format"));
        assert!(display.contains("[format at #/properties/email]"));
        assert!(display.contains("expected: email address"));
        assert!(display.contains("got: not-an-email"));
    }

    #[test]
    fn test_failure_from_empty_vec_is_none() {
        assert!(ValidationFailure::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn test_failure_combine_and_queries() {
        let a = JsonPointer::root().push_field("a");
        let b = JsonPointer::root().push_field("b");

        let failure = ValidationFailure::single(error(a.clone(), "type", "1"))
            .combine(ValidationFailure::single(error(a.clone(), "minimum", "2")))
            .combine(ValidationFailure::single(error(b.clone(), "type", "3")));

        assert_eq!(failure.len(), 3);
        assert!(!failure.is_empty());
        assert_eq!(failure.at_instance_path(&a).len(), 2);
        assert_eq!(failure.at_instance_path(&b).len(), 1);
        assert_eq!(failure.with_keyword("type").len(), 2);
        assert_eq!(failure.first().message, "1");
    }

    #[test]
    fn test_failure_display() {
        let failure = ValidationFailure::single(error(JsonPointer::root(), "required", "x"))
            .combine(ValidationFailure::single(error(JsonPointer::root(), "type", "y")));
        let display = failure.to_string();
        assert!(display.contains("2 error(s)"));
    }

    #[test]
    fn test_finish() {
        assert!(finish(Vec::new()).is_success());
        assert!(finish(vec![error(JsonPointer::root(), "not", "z")]).is_failure());
    }

    #[test]
    fn test_semigroup_associativity() {
        let e1 = ValidationFailure::single(error(JsonPointer::root(), "a", "1"));
        let e2 = ValidationFailure::single(error(JsonPointer::root(), "b", "2"));
        let e3 = ValidationFailure::single(error(JsonPointer::root(), "c", "3"));

        let left = e1.clone().combine(e2.clone()).combine(e3.clone());
        let right = e1.combine(e2.combine(e3));

        let left_msgs: Vec<_> = left.iter().map(|e| &e.message).collect();
        let right_msgs: Vec<_> = right.iter().map(|e| &e.message).collect();
        assert_eq!(left_msgs, right_msgs);
    }
}
