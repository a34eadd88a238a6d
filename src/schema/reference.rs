//! `$ref` evaluation.
//!
//! A reference is resolved through the document index each time it is
//! evaluated, and the target is validated against the same instance with the
//! reference depth incremented. Cycles are legal; the depth ceiling is what
//! stops an instance-independent cycle.

use tracing::{trace, warn};

use crate::error::{EvaluationError, ValidationError};
use crate::validator::{Location, ValidationContext};
use crate::value::Value;

/// Follows `reference` from the node at `at` and evaluates the target.
///
/// Errors reported by the target carry the target's canonical schema
/// location, not the location of the `$ref`.
pub(crate) fn follow(
    reference: &str,
    value: &Value,
    at: &Location,
    ctx: &ValidationContext<'_>,
) -> Result<Vec<ValidationError>, EvaluationError> {
    // Check depth before resolving to prevent infinite loops
    if ctx.depth() >= ctx.max_depth() {
        warn!(
            reference,
            location = %at.schema(),
            instance = %at.instance(),
            limit = ctx.max_depth(),
            "reference depth limit reached"
        );
        return Err(EvaluationError::RecursionLimitExceeded {
            limit: ctx.max_depth(),
            location: at.schema().clone(),
            instance: at.instance().clone(),
        });
    }

    let target = ctx.index().resolve(reference, at.schema())?;
    trace!(reference, target = %target.pointer, depth = ctx.depth(), "resolved $ref");

    let sub = Location::new(target.pointer.clone(), at.instance().clone());
    let mut errors = Vec::new();
    ctx.increment_depth()
        .evaluate_into(&target.schema, value, &sub, &mut errors)?;
    Ok(errors)
}
