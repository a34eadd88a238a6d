//! String keywords.
//!
//! This module provides [`StringKeywords`] (`minLength`, `maxLength`, `pattern`,
//! `format`) and the compiled [`Pattern`] shared with `patternProperties`.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{EvaluationError, ValidationError};
use crate::path::PathSegment;
use crate::validator::{Location, ValidationContext};
use crate::value::Value;

use super::format;
use super::traits::KeywordGroup;
use super::Schema;

/// A regular expression kept together with its source text.
///
/// Two patterns are equal when their sources are equal. Matching uses search
/// semantics: the expression may match anywhere in the input unless anchored.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(source)?,
            source: source.to_string(),
        })
    }

    /// Returns the source text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the pattern matches anywhere in `input`.
    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

/// Keywords that constrain string values.
///
/// Length is counted in Unicode scalar values, not bytes.
///
/// # Example
///
/// ```rust
/// use schemata::{Document, Schema, StringKeywords};
///
/// let schema = StringKeywords::new()
///     .min_len(3)
///     .max_len(20)
///     .pattern(r"^[a-z]+$")
///     .unwrap();
///
/// let doc = Document::new(Schema::from(schema)).unwrap();
/// assert!(doc.is_valid(&"alice".into()).unwrap());
/// // too short and not lowercase: both are reported
/// let result = doc.validate(&"AB".into()).unwrap();
/// assert!(result.is_failure());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringKeywords {
    /// `minLength`
    pub min_length: Option<u64>,
    /// `maxLength`
    pub max_length: Option<u64>,
    /// `pattern`
    pub pattern: Option<Pattern>,
    /// `format`
    pub format: Option<String>,
}

impl StringKeywords {
    /// Creates an empty keyword set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `minLength`.
    pub fn min_len(mut self, min: u64) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Sets `maxLength`.
    pub fn max_len(mut self, max: u64) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Sets `pattern`, failing if the expression does not compile.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(Pattern::new(pattern)?);
        Ok(self)
    }

    /// Sets `format`.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

impl KeywordGroup for StringKeywords {
    const KEYWORDS: &'static [&'static str] = &["minLength", "maxLength", "pattern", "format"];

    fn is_empty(&self) -> bool {
        self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.format.is_none()
    }

    fn subschemas(&self) -> Vec<(Vec<PathSegment>, &Arc<Schema>)> {
        Vec::new()
    }

    fn evaluate(
        &self,
        value: &Value,
        at: &Location,
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<ValidationError>, EvaluationError> {
        let Some(s) = value.as_str() else {
            return Ok(Vec::new());
        };

        let mut errors = Vec::new();
        let len = s.chars().count() as u64;

        if let Some(min) = self.min_length {
            if len < min {
                errors.push(
                    at.error(
                        "minLength",
                        format!("length must be at least {}, got {}", min, len),
                    )
                    .with_expected(format!("length >= {}", min))
                    .with_got(format!("length {}", len)),
                );
            }
        }

        if let Some(max) = self.max_length {
            if len > max {
                errors.push(
                    at.error(
                        "maxLength",
                        format!("length must be at most {}, got {}", max, len),
                    )
                    .with_expected(format!("length <= {}", max))
                    .with_got(format!("length {}", len)),
                );
            }
        }

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(s) {
                errors.push(
                    at.error(
                        "pattern",
                        format!("string does not match pattern '{}'", pattern.as_str()),
                    )
                    .with_expected(format!("match for /{}/", pattern.as_str()))
                    .with_got(format!("\"{}\"", s)),
                );
            }
        }

        if let Some(name) = &self.format {
            if ctx.asserts_formats() && !format::check(name, s) {
                errors.push(
                    at.error("format", format!("string is not a valid {}", name))
                        .with_expected(name.clone())
                        .with_got(format!("\"{}\"", s)),
                );
            }
        }

        Ok(errors)
    }
}
