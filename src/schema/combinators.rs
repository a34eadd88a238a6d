//! Schema combinators and conditionals.
//!
//! This module provides [`Combinators`], which holds `allOf`, `anyOf`, `oneOf`,
//! `not` and `if`/`then`/`else`. Every node type carries them.
//!
//! # Combinator Semantics
//!
//! - **allOf**: every subschema must match; failures from all of them accumulate
//! - **anyOf**: at least one subschema must match; stops at the first match
//! - **oneOf**: exactly one subschema must match; all are evaluated to tell
//!   "none matched" from "several matched"
//! - **not**: the subschema must not match
//! - **if/then/else**: `if` is a condition whose own failures are never reported;
//!   its outcome selects `then` or `else`

use std::sync::Arc;

use crate::error::{EvaluationError, ValidationError};
use crate::path::PathSegment;
use crate::validator::{Location, ValidationContext};
use crate::value::Value;

use super::traits::{seg, seg2, KeywordGroup};
use super::Schema;

/// The applicator keywords shared by every node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Combinators {
    /// `allOf`
    pub all_of: Vec<Arc<Schema>>,
    /// `anyOf`
    pub any_of: Vec<Arc<Schema>>,
    /// `oneOf`
    pub one_of: Vec<Arc<Schema>>,
    /// `not`
    pub not: Option<Arc<Schema>>,
    /// `if`
    pub if_schema: Option<Arc<Schema>>,
    /// `then`
    pub then_schema: Option<Arc<Schema>>,
    /// `else`
    pub else_schema: Option<Arc<Schema>>,
}

impl Combinators {
    fn check_any_of(
        &self,
        value: &Value,
        at: &Location,
        ctx: &ValidationContext<'_>,
    ) -> Result<Option<ValidationError>, EvaluationError> {
        for (i, schema) in self.any_of.iter().enumerate() {
            let sub = at.keyword_member("anyOf", PathSegment::index(i));
            if ctx.evaluate(schema, value, &sub)?.is_success() {
                return Ok(None);
            }
        }
        Ok(Some(
            at.error(
                "anyOf",
                format!("value did not match any of {} schemas", self.any_of.len()),
            )
            .with_code("any_of_none_matched"),
        ))
    }

    fn check_one_of(
        &self,
        value: &Value,
        at: &Location,
        ctx: &ValidationContext<'_>,
    ) -> Result<Option<ValidationError>, EvaluationError> {
        let mut matched = Vec::new();
        for (i, schema) in self.one_of.iter().enumerate() {
            let sub = at.keyword_member("oneOf", PathSegment::index(i));
            if ctx.evaluate(schema, value, &sub)?.is_success() {
                matched.push(i);
            }
        }

        Ok(match matched.len() {
            1 => None,
            0 => Some(
                at.error(
                    "oneOf",
                    format!("value did not match any of {} schemas", self.one_of.len()),
                )
                .with_code("one_of_none_matched"),
            ),
            n => Some(
                at.error(
                    "oneOf",
                    format!(
                        "value matched {} schemas (indices {:?}), expected exactly one",
                        n, matched
                    ),
                )
                .with_code("one_of_multiple_matched"),
            ),
        })
    }
}

impl KeywordGroup for Combinators {
    const KEYWORDS: &'static [&'static str] =
        &["allOf", "anyOf", "oneOf", "not", "if", "then", "else"];

    fn is_empty(&self) -> bool {
        self.all_of.is_empty()
            && self.any_of.is_empty()
            && self.one_of.is_empty()
            && self.not.is_none()
            && self.if_schema.is_none()
            && self.then_schema.is_none()
            && self.else_schema.is_none()
    }

    fn subschemas(&self) -> Vec<(Vec<PathSegment>, &Arc<Schema>)> {
        let mut out = Vec::new();
        for (keyword, list) in [
            ("allOf", &self.all_of),
            ("anyOf", &self.any_of),
            ("oneOf", &self.one_of),
        ] {
            for (i, schema) in list.iter().enumerate() {
                out.push((seg2(keyword, PathSegment::index(i)), schema));
            }
        }
        for (keyword, schema) in [
            ("not", &self.not),
            ("if", &self.if_schema),
            ("then", &self.then_schema),
            ("else", &self.else_schema),
        ] {
            if let Some(schema) = schema {
                out.push((seg(keyword), schema));
            }
        }
        out
    }

    fn evaluate(
        &self,
        value: &Value,
        at: &Location,
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationError>, EvaluationError> {
        let mut errors = Vec::new();

        for (i, schema) in self.all_of.iter().enumerate() {
            let sub = at.keyword_member("allOf", PathSegment::index(i));
            ctx.evaluate_into(schema, value, &sub, &mut errors)?;
        }

        if !self.any_of.is_empty() {
            errors.extend(self.check_any_of(value, at, ctx)?);
        }

        if !self.one_of.is_empty() {
            errors.extend(self.check_one_of(value, at, ctx)?);
        }

        if let Some(schema) = &self.not {
            if ctx.evaluate(schema, value, &at.keyword("not"))?.is_success() {
                errors.push(
                    at.error("not", "value must not match the schema in 'not'")
                        .with_code("not_matched"),
                );
            }
        }

        if let Some(condition) = &self.if_schema {
            let holds = ctx.evaluate(condition, value, &at.keyword("if"))?.is_success();
            let (keyword, branch) = if holds {
                ("then", &self.then_schema)
            } else {
                ("else", &self.else_schema)
            };
            if let Some(branch) = branch {
                ctx.evaluate_into(branch, value, &at.keyword(keyword), &mut errors)?;
            }
        }

        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::DocumentIndex;
    use crate::schema::{NumericKeywords, SchemaNode, StringKeywords};
    use crate::validator::ValidationOptions;
    use serde_json::json;

    fn run(combinators: &Combinators, value: serde_json::Value) -> Vec<ValidationError> {
        let index = DocumentIndex::empty();
        let options = ValidationOptions::default();
        let ctx = ValidationContext::new(&index, &options);
        combinators
            .evaluate(&Value::from(value), &Location::root(), &ctx)
            .expect("no references involved")
    }

    fn arcs(schemas: Vec<Schema>) -> Vec<Arc<Schema>> {
        schemas.into_iter().map(Arc::new).collect()
    }

    fn int_min(min: i64) -> Schema {
        SchemaNode::integer(NumericKeywords::new().minimum(min)).into()
    }

    #[test]
    fn test_one_of_none_one_many() {
        let c = Combinators {
            one_of: arcs(vec![int_min(0), int_min(10)]),
            ..Default::default()
        };
        assert_eq!(run(&c, json!(-1))[0].code, "one_of_none_matched");
        assert!(run(&c, json!(5)).is_empty());
        assert_eq!(run(&c, json!(15))[0].code, "one_of_multiple_matched");
    }

    #[test]
    fn test_any_of() {
        let c = Combinators {
            any_of: arcs(vec![StringKeywords::new().into(), int_min(0)]),
            ..Default::default()
        };
        assert!(run(&c, json!("x")).is_empty());
        assert!(run(&c, json!(3)).is_empty());
        assert_eq!(run(&c, json!(-3))[0].code, "any_of_none_matched");
    }

    #[test]
    fn test_all_of_accumulates() {
        let c = Combinators {
            all_of: arcs(vec![int_min(10), SchemaNode::integer(NumericKeywords::new().multiple_of(3)).into()]),
            ..Default::default()
        };
        let errors = run(&c, json!(4));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].schema_path.to_string(), "#/allOf/0");
        assert_eq!(errors[1].schema_path.to_string(), "#/allOf/1");
    }

    #[test]
    fn test_not() {
        let c = Combinators {
            not: Some(Arc::new(StringKeywords::new().into())),
            ..Default::default()
        };
        assert!(run(&c, json!(1)).is_empty());
        assert_eq!(run(&c, json!("s"))[0].keyword, "not");
    }

    #[test]
    fn test_if_then_else_condition_is_silent() {
        let c = Combinators {
            if_schema: Some(Arc::new(int_min(0))),
            then_schema: Some(Arc::new(SchemaNode::integer(NumericKeywords::new().maximum(10)).into())),
            else_schema: Some(Arc::new(SchemaNode::integer(NumericKeywords::new().minimum(-10)).into())),
            ..Default::default()
        };
        assert!(run(&c, json!(5)).is_empty());
        assert!(run(&c, json!(-5)).is_empty());
        let errors = run(&c, json!(50));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].schema_path.to_string(), "#/then");
        assert_eq!(run(&c, json!(-50))[0].schema_path.to_string(), "#/else");
    }

    #[test]
    fn test_if_without_branches_never_fails() {
        let c = Combinators {
            if_schema: Some(Arc::new(Schema::Bool(false))),
            ..Default::default()
        };
        assert!(run(&c, json!("anything")).is_empty());
    }
}
