//! JSON Pointer representation for locating nodes in schemas and instances.
//!
//! This module provides [`JsonPointer`] and [`PathSegment`] types. The same type
//! addresses schema locations (`#/properties/name`) and instance locations
//! (`#/users/0/email`), and parses the pointer fragments found in `$ref` values.
//!
//! Pointers render in URI-fragment form: the root is `#`, and each segment is
//! prefixed with `/`, with `~` and `/` escaped as `~0` and `~1` (RFC 6901).

use std::fmt::{self, Display};

/// A segment of a JSON Pointer.
///
/// Pointers are built from segments that represent either a member name or an
/// array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object member or schema keyword (e.g., `properties`, `email`)
    Field(String),
    /// An array index (e.g., `0`, `42`)
    Index(usize),
}

impl PathSegment {
    /// Creates a new field segment.
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }

    /// Creates a new index segment.
    pub fn index(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", escape_segment(name)),
            PathSegment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// Errors produced when parsing a pointer string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointerError {
    /// The pointer is neither empty nor starts with `/` (after an optional `#`).
    #[error("pointer '{0}' must be empty or start with '/'")]
    MissingSlash(String),
    /// A `~` was not followed by `0` or `1`.
    #[error("pointer '{0}' contains an invalid '~' escape")]
    InvalidEscape(String),
    /// A `%` escape in a URI fragment was malformed.
    #[error("pointer '{0}' contains an invalid percent escape")]
    InvalidPercentEscape(String),
}

/// A JSON Pointer to a value in a nested JSON-like structure.
///
/// `JsonPointer` is immutable; the `push_*` methods return extended copies so a
/// parent pointer can be shared by several children.
///
/// # Example
///
/// ```rust
/// use schemata::JsonPointer;
///
/// let path = JsonPointer::root()
///     .push_field("users")
///     .push_index(0)
///     .push_field("email");
///
/// assert_eq!(path.to_string(), "#/users/0/email");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPointer {
    segments: Vec<PathSegment>,
}

impl JsonPointer {
    /// Creates an empty pointer representing the root value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a pointer from a single field segment.
    pub fn from_field(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Field(name.into())],
        }
    }

    /// Creates a pointer from a single index segment.
    pub fn from_index(idx: usize) -> Self {
        Self {
            segments: vec![PathSegment::Index(idx)],
        }
    }

    /// Parses a pointer in either URI-fragment form (`#/a/b`) or plain form (`/a/b`).
    ///
    /// Fragment-form pointers are percent-decoded before `~` unescaping, so
    /// `#/$defs/a%25b` addresses the member `a%b`. Every parsed segment is a
    /// [`PathSegment::Field`]; rendering is what makes pointers comparable.
    ///
    /// # Example
    ///
    /// ```rust
    /// use schemata::JsonPointer;
    ///
    /// let ptr = JsonPointer::parse("#/$defs/a~1b").unwrap();
    /// assert_eq!(ptr.len(), 2);
    /// assert_eq!(ptr.to_string(), "#/$defs/a~1b");
    /// ```
    pub fn parse(input: &str) -> Result<Self, PointerError> {
        let (body, fragment) = match input.strip_prefix('#') {
            Some(rest) => (rest, true),
            None => (input, false),
        };

        if body.is_empty() {
            return Ok(Self::root());
        }

        let decoded = if fragment {
            percent_decode(body).ok_or_else(|| PointerError::InvalidPercentEscape(input.into()))?
        } else {
            body.to_string()
        };

        let rest = decoded
            .strip_prefix('/')
            .ok_or_else(|| PointerError::MissingSlash(input.to_string()))?;

        let mut segments = Vec::new();
        for raw in rest.split('/') {
            let segment =
                unescape_segment(raw).ok_or_else(|| PointerError::InvalidEscape(input.into()))?;
            segments.push(PathSegment::Field(segment));
        }
        Ok(Self { segments })
    }

    /// Returns a new pointer with a field segment appended.
    ///
    /// This method does not modify the original pointer; it returns a new one.
    pub fn push_field(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Field(name.into()));
        Self { segments }
    }

    /// Returns a new pointer with an index segment appended.
    ///
    /// This method does not modify the original pointer; it returns a new one.
    pub fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Returns a new pointer with `segment` appended.
    pub fn push(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Returns a new pointer with every segment of `tail` appended.
    pub fn join(&self, tail: &[PathSegment]) -> Self {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(tail);
        Self { segments }
    }

    /// Returns true if this is the root pointer (no segments).
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments in this pointer.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this pointer has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns an iterator over the segments.
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// Returns the parent pointer, or None if this is root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            Some(Self {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// Returns the last segment, or None if this is root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Renders the pointer in plain RFC 6901 form (no leading `#`).
    pub fn to_plain_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            out.push_str(&segment.to_string());
        }
        out
    }
}

impl Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_plain_string())
    }
}

/// Escapes `~` and `/` in a pointer segment.
pub fn escape_segment(segment: &str) -> String {
    if !segment.contains('/') && !segment.contains('~') {
        return segment.to_string();
    }
    segment.replace('~', "~0").replace('/', "~1")
}

/// Reverses [`escape_segment`], rejecting dangling or unknown `~` escapes.
fn unescape_segment(segment: &str) -> Option<String> {
    if !segment.contains('~') {
        return Some(segment.to_string());
    }
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Decodes `%XX` escapes in a URI fragment.
pub(crate) fn percent_decode(input: &str) -> Option<String> {
    if !input.contains('%') {
        return Some(input.to_string());
    }
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
