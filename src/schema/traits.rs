//! Traits shared by the keyword groups of a schema node.
//!
//! This module provides the [`KeywordGroup`] trait that every keyword set
//! (object, array, string, numeric, combinators) implements so the parser,
//! index, serializer and validator can treat them uniformly.

use std::sync::Arc;

use crate::error::{EvaluationError, ValidationError};
use crate::path::PathSegment;
use crate::validator::{Location, ValidationContext};
use crate::value::Value;

use super::Schema;

/// A set of keywords that belong together and are evaluated together.
///
/// A group only evaluates instances of the kind it describes: an object group
/// returns no errors for a string, which is what lets an untyped node carry
/// several groups at once.
pub trait KeywordGroup: Send + Sync {
    /// The keyword names owned by this group, in canonical emission order.
    const KEYWORDS: &'static [&'static str];

    /// Returns true if no keyword of the group is set.
    fn is_empty(&self) -> bool;

    /// Returns every direct subschema with the pointer segments leading to it.
    fn subschemas(&self) -> Vec<(Vec<PathSegment>, &Arc<Schema>)>;

    /// Evaluates the group against a value.
    ///
    /// All violated keywords are reported; only fatal conditions short-circuit.
    fn evaluate(
        &self,
        value: &Value,
        at: &Location,
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationError>, EvaluationError>;

    /// Returns true if `keyword` belongs to this group.
    fn owns(keyword: &str) -> bool {
        Self::KEYWORDS.contains(&keyword)
    }
}

/// Shorthand for a single pointer segment naming a keyword.
pub(crate) fn seg(keyword: &str) -> Vec<PathSegment> {
    vec![PathSegment::field(keyword)]
}

/// Shorthand for a keyword followed by a member name or index.
pub(crate) fn seg2(keyword: &str, second: PathSegment) -> Vec<PathSegment> {
    vec![PathSegment::field(keyword), second]
}
