//! Lookup from locations to schema nodes within one document.
//!
//! This module provides [`DocumentIndex`]. Every subschema reachable by
//! structural descent is recorded under its JSON Pointer. Nodes that declare
//! `$id` open a new resource with its own base URI, and `$anchor` /
//! `$dynamicAnchor` names are recorded as plain-name fragments of the
//! enclosing resource. References are resolved against the base URI in
//! effect at the node holding the `$ref`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::error::{EvaluationError, InvalidSchema};
use crate::path::{percent_decode, JsonPointer};
use crate::schema::Schema;

/// Base URI of a document that declares no `$id`.
pub const DEFAULT_BASE_URI: &str = "json-schema:///";

static ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][-A-Za-z0-9._]*$").expect("anchor pattern is valid"));

static DEFAULT_BASE: Lazy<Url> =
    Lazy::new(|| Url::parse(DEFAULT_BASE_URI).expect("default base URI is valid"));

/// An indexed subschema.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Canonical location within the document.
    pub pointer: JsonPointer,
    /// Base URI in effect at this node, after applying its own `$id`.
    pub base: Url,
    /// The subschema.
    pub schema: Arc<Schema>,
}

/// Index of one document's subschemas by pointer and by URI.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    entries: IndexMap<String, Entry>,
    aliases: HashMap<String, String>,
    resources: HashSet<String>,
}

impl Default for DocumentIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl DocumentIndex {
    /// Creates an index with no entries.
    pub fn empty() -> Self {
        let mut resources = HashSet::new();
        resources.insert(DEFAULT_BASE.to_string());
        Self {
            entries: IndexMap::new(),
            aliases: HashMap::new(),
            resources,
        }
    }

    /// Indexes every subschema of `root`.
    ///
    /// Fails if an `$id` is not a valid URI reference, if an anchor name is
    /// malformed, or if an anchor is declared twice in one resource.
    pub fn build(root: &Arc<Schema>) -> Result<Self, InvalidSchema> {
        let mut index = Self::empty();
        let base = DEFAULT_BASE.clone();
        let scopes = [(base.clone(), JsonPointer::root())];
        index.walk(root, JsonPointer::root(), &base, &scopes)?;
        debug!(
            entries = index.entries.len(),
            resources = index.resources.len(),
            "indexed schema document"
        );
        Ok(index)
    }

    fn walk(
        &mut self,
        schema: &Arc<Schema>,
        pointer: JsonPointer,
        base: &Url,
        scopes: &[(Url, JsonPointer)],
    ) -> Result<(), InvalidSchema> {
        let mut base = base.clone();
        let mut scopes = scopes.to_vec();

        if let Some(id) = schema.as_node().and_then(|n| n.common.id.as_ref()) {
            let mut joined = base.join(id).map_err(|e| {
                InvalidSchema::new(
                    pointer.clone(),
                    "$id",
                    format!("is not a valid URI reference: {}", e),
                )
            })?;
            joined.set_fragment(None);
            self.resources.insert(joined.to_string());
            scopes.push((joined.clone(), pointer.clone()));
            base = joined;
        }

        // reachable by pointer from every enclosing resource
        let canonical = pointer.to_string();
        for (scope_base, scope_root) in &scopes {
            let relative: Vec<_> = pointer.segments().skip(scope_root.len()).cloned().collect();
            self.aliases
                .entry(format!(
                    "{}#{}",
                    scope_base,
                    JsonPointer::root().join(&relative).to_plain_string()
                ))
                .or_insert_with(|| canonical.clone());
        }

        if let Some(node) = schema.as_node() {
            for (keyword, name) in [
                ("$anchor", &node.common.anchor),
                ("$dynamicAnchor", &node.common.dynamic_anchor),
            ] {
                let Some(name) = name else { continue };
                if !ANCHOR.is_match(name) {
                    return Err(InvalidSchema::new(
                        pointer.clone(),
                        keyword,
                        format!("'{}' is not a valid anchor name", name),
                    ));
                }
                let key = format!("{}#{}", base, name);
                match self.aliases.get(&key) {
                    Some(existing) if existing != &canonical => {
                        return Err(InvalidSchema::new(
                            pointer.clone(),
                            keyword,
                            format!("'{}' is already declared at {}", name, existing),
                        ));
                    }
                    _ => {
                        self.aliases.insert(key, canonical.clone());
                    }
                }
            }
        }

        self.entries.insert(
            canonical,
            Entry {
                pointer: pointer.clone(),
                base: base.clone(),
                schema: Arc::clone(schema),
            },
        );

        for (segments, child) in schema.subschemas() {
            self.walk(child, pointer.join(&segments), &base, &scopes)?;
        }
        Ok(())
    }

    /// Returns the entry at a canonical document pointer.
    pub fn get(&self, pointer: &JsonPointer) -> Option<&Entry> {
        self.entries.get(&pointer.to_string())
    }

    /// Returns the number of indexed subschemas.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns every indexed pointer in document order.
    pub fn pointers(&self) -> impl Iterator<Item = &JsonPointer> {
        self.entries.values().map(|e| &e.pointer)
    }

    /// Resolves `reference` as written in the node at `from`.
    ///
    /// Fails with [`EvaluationError::UnresolvableReference`] if the reference
    /// points into this document but nothing is there, and with
    /// [`EvaluationError::NotYetImplemented`] if it names another document.
    pub fn resolve(&self, reference: &str, from: &JsonPointer) -> Result<&Entry, EvaluationError> {
        let unresolvable = || EvaluationError::UnresolvableReference {
            reference: reference.to_string(),
            location: from.clone(),
        };

        let base = self
            .entries
            .get(&from.to_string())
            .map_or(&*DEFAULT_BASE, |e| &e.base);
        let mut target = base.join(reference).map_err(|_| unresolvable())?;
        let fragment = percent_decode(target.fragment().unwrap_or("")).ok_or_else(unresolvable)?;
        target.set_fragment(None);

        let key = if fragment.is_empty() || fragment.starts_with('/') {
            let pointer = JsonPointer::parse(&fragment).map_err(|_| unresolvable())?;
            format!("{}#{}", target, pointer.to_plain_string())
        } else {
            format!("{}#{}", target, fragment)
        };

        if let Some(entry) = self.aliases.get(&key).and_then(|c| self.entries.get(c)) {
            return Ok(entry);
        }
        if self.resources.contains(target.as_str()) {
            Err(unresolvable())
        } else {
            Err(EvaluationError::NotYetImplemented {
                feature: format!("external reference '{}'", reference),
                location: from.clone(),
            })
        }
    }

    /// Returns every `$ref` that does not resolve, with the location holding it.
    pub fn unresolved(&self) -> Vec<(JsonPointer, String)> {
        self.entries
            .values()
            .filter_map(|entry| {
                let reference = entry.schema.as_node()?.common.reference.as_ref()?;
                match self.resolve(reference, &entry.pointer) {
                    Ok(_) => None,
                    Err(_) => Some((entry.pointer.clone(), reference.clone())),
                }
            })
            .collect()
    }
}
