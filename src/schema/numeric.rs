//! Numeric keywords.
//!
//! This module provides [`NumericKeywords`], shared by `integer` and `number`
//! nodes: `minimum`, `maximum`, `exclusiveMinimum`, `exclusiveMaximum` and
//! `multipleOf`.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{EvaluationError, ValidationError};
use crate::path::PathSegment;
use crate::validator::{Location, ValidationContext};
use crate::value::{Number, Value};

use super::traits::KeywordGroup;
use super::Schema;

/// Tolerance for the remainder of a non-integer `multipleOf` division.
const MULTIPLE_OF_EPSILON: f64 = 1e-9;

/// Keywords that constrain numeric values.
///
/// All bounds are compared mathematically, so `1` and `1.0` are the same bound.
/// `multipleOf` is exact when both operands are integers and uses a small
/// tolerance otherwise.
///
/// # Example
///
/// ```rust
/// use schemata::{Document, NumericKeywords, SchemaNode};
///
/// let doc = Document::new(
///     SchemaNode::integer(NumericKeywords::new().minimum(0).maximum(100)).into(),
/// )
/// .unwrap();
///
/// assert!(doc.is_valid(&50.into()).unwrap());
/// assert!(!doc.is_valid(&(-50).into()).unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericKeywords {
    /// `minimum` (inclusive)
    pub minimum: Option<Number>,
    /// `maximum` (inclusive)
    pub maximum: Option<Number>,
    /// `exclusiveMinimum`
    pub exclusive_minimum: Option<Number>,
    /// `exclusiveMaximum`
    pub exclusive_maximum: Option<Number>,
    /// `multipleOf`, always greater than zero
    pub multiple_of: Option<Number>,
}

impl NumericKeywords {
    /// Creates an empty keyword set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `minimum`.
    pub fn minimum(mut self, value: impl Into<Number>) -> Self {
        self.minimum = Some(value.into());
        self
    }

    /// Sets `maximum`.
    pub fn maximum(mut self, value: impl Into<Number>) -> Self {
        self.maximum = Some(value.into());
        self
    }

    /// Sets `exclusiveMinimum`.
    pub fn exclusive_minimum(mut self, value: impl Into<Number>) -> Self {
        self.exclusive_minimum = Some(value.into());
        self
    }

    /// Sets `exclusiveMaximum`.
    pub fn exclusive_maximum(mut self, value: impl Into<Number>) -> Self {
        self.exclusive_maximum = Some(value.into());
        self
    }

    /// Sets `multipleOf`.
    pub fn multiple_of(mut self, value: impl Into<Number>) -> Self {
        self.multiple_of = Some(value.into());
        self
    }

    /// Requires values greater than zero.
    pub fn positive(self) -> Self {
        self.exclusive_minimum(0)
    }

    /// Requires values of zero or more.
    pub fn non_negative(self) -> Self {
        self.minimum(0)
    }
}

/// Returns true if `value` is an integer multiple of `divisor`.
pub(crate) fn is_multiple_of(value: &Number, divisor: &Number) -> bool {
    if let (Some(v), Some(d)) = (value.as_i64(), divisor.as_i64()) {
        if d != 0 {
            // MIN % -1 overflows but is a multiple
            return v.checked_rem(d).map_or(true, |r| r == 0);
        }
    }
    let quotient = value.as_f64() / divisor.as_f64();
    quotient.is_finite() && (quotient - quotient.round()).abs() < MULTIPLE_OF_EPSILON
}

impl KeywordGroup for NumericKeywords {
    const KEYWORDS: &'static [&'static str] = &[
        "minimum",
        "maximum",
        "exclusiveMinimum",
        "exclusiveMaximum",
        "multipleOf",
    ];

    fn is_empty(&self) -> bool {
        self.minimum.is_none()
            && self.maximum.is_none()
            && self.exclusive_minimum.is_none()
            && self.exclusive_maximum.is_none()
            && self.multiple_of.is_none()
    }

    fn subschemas(&self) -> Vec<(Vec<PathSegment>, &Arc<Schema>)> {
        Vec::new()
    }

    fn evaluate(
        &self,
        value: &Value,
        at: &Location,
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationError>, EvaluationError> {
        let Some(n) = value.as_number() else {
            return Ok(Vec::new());
        };

        let mut errors = Vec::new();
        let mut bound = |keyword: &str, limit: &Option<Number>, ok: fn(Ordering) -> bool, op: &str| {
            if let Some(limit) = limit {
                // NaN never satisfies a bound
                if !n.compare(limit).map_or(false, ok) {
                    errors.push(
                        at.error(keyword, format!("value must be {} {}", op, limit))
                            .with_expected(format!("{} {}", op, limit))
                            .with_got(n.to_string()),
                    );
                }
            }
        };

        bound("minimum", &self.minimum, |o| o != Ordering::Less, ">=");
        bound("maximum", &self.maximum, |o| o != Ordering::Greater, "<=");
        bound(
            "exclusiveMinimum",
            &self.exclusive_minimum,
            |o| o == Ordering::Greater,
            ">",
        );
        bound(
            "exclusiveMaximum",
            &self.exclusive_maximum,
            |o| o == Ordering::Less,
            "<",
        );

        if let Some(divisor) = &self.multiple_of {
            if !is_multiple_of(n, divisor) {
                errors.push(
                    at.error("multipleOf", format!("value must be a multiple of {}", divisor))
                        .with_expected(format!("multiple of {}", divisor))
                        .with_got(n.to_string()),
                );
            }
        }

        Ok(errors)
    }
}
