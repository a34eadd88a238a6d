//! Array keywords.
//!
//! This module provides [`ArrayKeywords`] for validating JSON arrays with
//! positional (`prefixItems`) and trailing (`items`) item schemas, `contains`
//! counting, length bounds and uniqueness.

use std::sync::Arc;

use crate::error::{EvaluationError, ValidationError};
use crate::path::PathSegment;
use crate::validator::{Location, ValidationContext};
use crate::value::Value;

use super::traits::{seg, seg2, KeywordGroup};
use super::Schema;

/// Keywords that constrain array values.
///
/// `prefixItems` validates items by position; `items` validates every item
/// past the prefix. Every item failure is reported, with the item index in the
/// instance path.
///
/// # Example
///
/// ```rust
/// use schemata::{ArrayKeywords, Document, StringKeywords};
/// use serde_json::json;
///
/// let tags = ArrayKeywords::new()
///     .items(StringKeywords::new().min_len(1))
///     .min_items(1)
///     .unique();
///
/// let doc = Document::new(tags.into()).unwrap();
/// assert!(doc.is_valid(&json!(["a", "b"]).into()).unwrap());
/// assert!(!doc.is_valid(&json!(["a", "a"]).into()).unwrap());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayKeywords {
    /// `prefixItems`
    pub prefix_items: Vec<Arc<Schema>>,
    /// `items`
    pub items: Option<Arc<Schema>>,
    /// `contains`
    pub contains: Option<Arc<Schema>>,
    /// `minContains`
    pub min_contains: Option<u64>,
    /// `maxContains`
    pub max_contains: Option<u64>,
    /// `minItems`
    pub min_items: Option<u64>,
    /// `maxItems`
    pub max_items: Option<u64>,
    /// `uniqueItems`
    pub unique_items: bool,
}

impl ArrayKeywords {
    /// Creates an empty keyword set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional schema to `prefixItems`.
    pub fn prefix_item(mut self, schema: impl Into<Schema>) -> Self {
        self.prefix_items.push(Arc::new(schema.into()));
        self
    }

    /// Sets `items`.
    pub fn items(mut self, schema: impl Into<Schema>) -> Self {
        self.items = Some(Arc::new(schema.into()));
        self
    }

    /// Sets `contains`.
    pub fn contains(mut self, schema: impl Into<Schema>) -> Self {
        self.contains = Some(Arc::new(schema.into()));
        self
    }

    /// Sets `minContains`.
    pub fn min_contains(mut self, min: u64) -> Self {
        self.min_contains = Some(min);
        self
    }

    /// Sets `maxContains`.
    pub fn max_contains(mut self, max: u64) -> Self {
        self.max_contains = Some(max);
        self
    }

    /// Sets `minItems`.
    pub fn min_items(mut self, min: u64) -> Self {
        self.min_items = Some(min);
        self
    }

    /// Sets `maxItems`.
    pub fn max_items(mut self, max: u64) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Sets `uniqueItems: true`.
    pub fn unique(mut self) -> Self {
        self.unique_items = true;
        self
    }

    fn check_contains(
        &self,
        contains: &Schema,
        items: &[Value],
        at: &Location,
        ctx: &ValidationContext<'_>,
        errors: &mut Vec<ValidationError>,
    ) -> Result<(), EvaluationError> {
        let scope = at.keyword("contains");
        let mut matched = 0u64;
        for (i, item) in items.iter().enumerate() {
            if ctx.evaluate(contains, item, &scope.item(PathSegment::index(i)))?.is_success() {
                matched += 1;
            }
        }

        let min = self.min_contains.unwrap_or(1);
        if matched < min {
            let keyword = if self.min_contains.is_some() {
                "minContains"
            } else {
                "contains"
            };
            errors.push(
                at.error(
                    keyword,
                    format!("array must contain at least {} matching item(s), found {}", min, matched),
                )
                .with_expected(format!(">= {} matches", min))
                .with_got(matched.to_string()),
            );
        }
        if let Some(max) = self.max_contains {
            if matched > max {
                errors.push(
                    at.error(
                        "maxContains",
                        format!("array must contain at most {} matching item(s), found {}", max, matched),
                    )
                    .with_expected(format!("<= {} matches", max))
                    .with_got(matched.to_string()),
                );
            }
        }
        Ok(())
    }
}

/// Returns the first pair of indices holding equal items.
fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for (i, a) in items.iter().enumerate() {
        for (j, b) in items.iter().enumerate().skip(i + 1) {
            if a == b {
                return Some((i, j));
            }
        }
    }
    None
}

impl KeywordGroup for ArrayKeywords {
    const KEYWORDS: &'static [&'static str] = &[
        "prefixItems",
        "items",
        "contains",
        "minContains",
        "maxContains",
        "minItems",
        "maxItems",
        "uniqueItems",
    ];

    fn is_empty(&self) -> bool {
        self.prefix_items.is_empty()
            && self.items.is_none()
            && self.contains.is_none()
            && self.min_contains.is_none()
            && self.max_contains.is_none()
            && self.min_items.is_none()
            && self.max_items.is_none()
            && !self.unique_items
    }

    fn subschemas(&self) -> Vec<(Vec<PathSegment>, &Arc<Schema>)> {
        let mut out = Vec::new();
        for (i, schema) in self.prefix_items.iter().enumerate() {
            out.push((seg2("prefixItems", PathSegment::index(i)), schema));
        }
        if let Some(schema) = &self.items {
            out.push((seg("items"), schema));
        }
        if let Some(schema) = &self.contains {
            out.push((seg("contains"), schema));
        }
        out
    }

    fn evaluate(
        &self,
        value: &Value,
        at: &Location,
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationError>, EvaluationError> {
        let Some(items) = value.as_array() else {
            return Ok(Vec::new());
        };

        let mut errors = Vec::new();
        let len = items.len() as u64;

        if let Some(min) = self.min_items {
            if len < min {
                errors.push(
                    at.error(
                        "minItems",
                        format!("array must have at least {} items, got {}", min, len),
                    )
                    .with_expected(format!(">= {} items", min))
                    .with_got(len.to_string()),
                );
            }
        }
        if let Some(max) = self.max_items {
            if len > max {
                errors.push(
                    at.error(
                        "maxItems",
                        format!("array must have at most {} items, got {}", max, len),
                    )
                    .with_expected(format!("<= {} items", max))
                    .with_got(len.to_string()),
                );
            }
        }

        if self.unique_items {
            if let Some((i, j)) = first_duplicate(items) {
                errors.push(at.error(
                    "uniqueItems",
                    format!("items at positions {} and {} are equal", i, j),
                ));
            }
        }

        for (i, (schema, item)) in self.prefix_items.iter().zip(items).enumerate() {
            let sub = at
                .keyword_member("prefixItems", PathSegment::index(i))
                .item(PathSegment::index(i));
            ctx.evaluate_into(schema, item, &sub, &mut errors)?;
        }

        if let Some(schema) = &self.items {
            let start = self.prefix_items.len();
            if matches!(schema.as_ref(), Schema::Bool(false)) {
                if items.len() > start {
                    errors.push(
                        at.keyword("items").error(
                            "items",
                            format!("array allows at most {} items, got {}", start, items.len()),
                        )
                        .with_code("additional_items"),
                    );
                }
            } else {
                let sub = at.keyword("items");
                for (i, item) in items.iter().enumerate().skip(start) {
                    ctx.evaluate_into(schema, item, &sub.item(PathSegment::index(i)), &mut errors)?;
                }
            }
        }

        if let Some(contains) = &self.contains {
            self.check_contains(contains, items, at, ctx, &mut errors)?;
        }

        Ok(errors)
    }
}
