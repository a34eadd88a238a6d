//! Error types for schema parsing and validation.
//!
//! Three families of outcome are kept apart:
//! - [`InvalidSchema`]: the schema document itself is malformed.
//! - [`ValidationFailure`]: the instance does not satisfy a valid schema. This is
//!   an expected result, carried inside `stillwater::Validation`.
//! - [`EvaluationError`]: validation could not be completed (unresolvable
//!   reference, unsupported feature, recursion ceiling).
//!
//! [`Error`] unifies them for callers that want a single `Result`.

mod validation_error;

pub use validation_error::{ValidationError, ValidationFailure};

pub(crate) use validation_error::finish;

use crate::path::JsonPointer;

/// The schema document is malformed: a keyword is misplaced, unknown, or has a
/// value of the wrong shape.
///
/// `pointer` addresses the schema node that carries the offending keyword.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid schema at {pointer}: keyword '{keyword}' {reason}")]
pub struct InvalidSchema {
    /// Location of the schema node holding the keyword.
    pub pointer: JsonPointer,
    /// The offending keyword.
    pub keyword: String,
    /// What is wrong with it.
    pub reason: String,
}

impl InvalidSchema {
    /// Creates a new error.
    pub fn new(pointer: JsonPointer, keyword: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            pointer,
            keyword: keyword.into(),
            reason: reason.into(),
        }
    }
}

/// Conditions that abort a validation call instead of producing a verdict.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    /// A `$ref` targets this document but nothing exists at that location.
    #[error("unresolvable reference '{reference}' at {location}")]
    UnresolvableReference {
        /// The `$ref` value as written.
        reference: String,
        /// Schema location of the node holding the `$ref`.
        location: JsonPointer,
    },

    /// The schema uses a feature the engine does not evaluate.
    #[error("not yet implemented: {feature} at {location}")]
    NotYetImplemented {
        /// The keyword or capability that is missing.
        feature: String,
        /// Schema location where it was encountered.
        location: JsonPointer,
    },

    /// `$ref` descent exceeded the configured ceiling.
    #[error("recursion limit of {limit} exceeded at {location} (instance {instance})")]
    RecursionLimitExceeded {
        /// The configured maximum depth.
        limit: usize,
        /// Schema location of the `$ref` that would exceed it.
        location: JsonPointer,
        /// Instance location being validated at that point.
        instance: JsonPointer,
    },
}

impl EvaluationError {
    /// Returns true for [`EvaluationError::NotYetImplemented`].
    pub fn is_not_yet_implemented(&self) -> bool {
        matches!(self, EvaluationError::NotYetImplemented { .. })
    }
}

/// Umbrella error for the throwing validation API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The schema could not be parsed.
    #[error(transparent)]
    InvalidSchema(#[from] InvalidSchema),

    /// The instance does not satisfy the schema.
    #[error("invalid value: {}", .0.first())]
    InvalidValue(ValidationFailure),

    /// Validation was aborted.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

impl From<ValidationFailure> for Error {
    fn from(failure: ValidationFailure) -> Self {
        Error::InvalidValue(failure)
    }
}
