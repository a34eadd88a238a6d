//! Schema registry for named document storage.
//!
//! This module provides the [`SchemaRegistry`] type that stores parsed
//! documents under names and validates values against them by name.

use parking_lot::RwLock;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::document::Document;
use crate::error::{EvaluationError, InvalidSchema};
use crate::parser::{ParseOptions, DRAFT_2020_12};
use crate::path::JsonPointer;
use crate::validator::{ValidationOptions, Validator};
use crate::value::{Map, Value};
use crate::ValidationResult;

type DocumentMap = Arc<RwLock<IndexMap<String, Arc<Document>>>>;

/// A thread-safe registry of named schema documents.
///
/// Cloning a registry is cheap and the clones share storage.
///
/// # Thread Safety
///
/// Documents are stored behind `Arc<RwLock<...>>`:
/// - Multiple threads can validate concurrently (read-only access)
/// - Registration operations are serialized (write access)
///
/// # Example
///
/// ```rust
/// use schemata::SchemaRegistry;
/// use serde_json::json;
///
/// let registry = SchemaRegistry::new();
/// registry
///     .register_json("User", &json!({
///         "type": "object",
///         "properties": {"name": {"type": "string", "minLength": 1}},
///         "required": ["name"]
///     }).into())
///     .unwrap();
///
/// let result = registry.validate("User", &json!({"name": "Ada"}).into()).unwrap();
/// assert!(result.is_success());
/// ```
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    documents: DocumentMap,
    parse_options: ParseOptions,
    options: ValidationOptions,
}

impl SchemaRegistry {
    /// Creates an empty registry with default parse and validation options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum `$ref` depth used by [`SchemaRegistry::validate`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use schemata::SchemaRegistry;
    ///
    /// let registry = SchemaRegistry::new().with_max_depth(50);
    /// assert_eq!(registry.options().max_depth(), 50);
    /// ```
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.options = self.options.with_max_depth(depth);
        self
    }

    /// Replaces the validation options.
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the options used by [`SchemaRegistry::register_json`].
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Returns the validation options.
    pub fn options(&self) -> &ValidationOptions {
        &self.options
    }

    /// Returns the options used to parse registered JSON.
    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse_options
    }

    /// Registers a document under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name is taken.
    pub fn register(&self, name: impl Into<String>, document: Document) -> Result<(), RegistryError> {
        let name = name.into();
        let mut documents = self.documents.write();

        if documents.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        debug!(name = %name, nodes = document.index().len(), "registered schema");
        documents.insert(name, Arc::new(document));
        Ok(())
    }

    /// Parses `schema` with the registry's parse options and registers it.
    pub fn register_json(&self, name: impl Into<String>, schema: &Value) -> Result<(), RegistryError> {
        let name = name.into();
        let document = Document::from_json_with(schema, self.parse_options).map_err(|source| {
            RegistryError::InvalidSchema {
                name: name.clone(),
                source,
            }
        })?;
        self.register(name, document)
    }

    /// Retrieves a document by name.
    pub fn get(&self, name: &str) -> Option<Arc<Document>> {
        self.documents.read().get(name).cloned()
    }

    /// Retrieves a document by the `$id` of its root.
    pub fn get_by_id(&self, id: &str) -> Option<Arc<Document>> {
        self.documents
            .read()
            .values()
            .find(|doc| doc.root().as_node().and_then(|n| n.common.id.as_deref()) == Some(id))
            .cloned()
    }

    /// Returns the registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.documents.read().keys().cloned().collect()
    }

    /// Returns the number of registered documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Removes a document, returning it if it was registered.
    pub fn remove(&self, name: &str) -> Option<Arc<Document>> {
        let removed = self.documents.write().shift_remove(name);
        if removed.is_some() {
            debug!(name, "removed schema");
        }
        removed
    }

    /// Lists every `$ref` that does not resolve within its own document.
    ///
    /// Each entry is the registry name, the pointer of the node holding the
    /// reference, and the reference text.
    pub fn unresolved_refs(&self) -> Vec<(String, JsonPointer, String)> {
        self.documents
            .read()
            .iter()
            .flat_map(|(name, doc)| {
                doc.unresolved_refs()
                    .into_iter()
                    .map(move |(pointer, reference)| (name.clone(), pointer, reference))
            })
            .collect()
    }

    /// Validates a value against a named document.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SchemaNotFound`] if the name doesn't exist and
    /// [`RegistryError::Evaluation`] if evaluation cannot complete.
    pub fn validate(&self, name: &str, value: &Value) -> Result<ValidationResult<()>, RegistryError> {
        let document = self
            .get(name)
            .ok_or_else(|| RegistryError::SchemaNotFound(name.to_string()))?;

        Validator::new(&document)
            .with_options(self.options)
            .validate(value)
            .map_err(|source| RegistryError::Evaluation {
                name: name.to_string(),
                source,
            })
    }

    /// Exports every registered document under `$defs` of one draft 2020-12
    /// document.
    ///
    /// An object document without its own `$id` is given `"$id":
    /// "<name>.json"`, so its local references such as `#/$defs/Leaf` keep
    /// resolving inside the entry instead of against the combined root.
    pub fn to_json_schema(&self) -> Value {
        let defs: Map = self
            .documents
            .read()
            .iter()
            .map(|(name, doc)| (name.clone(), exported_entry(name, doc)))
            .collect();

        let mut out = Map::new();
        out.insert("$schema".to_string(), Value::from(DRAFT_2020_12));
        out.insert("$defs".to_string(), Value::Object(defs));
        Value::Object(out)
    }
}

fn exported_entry(name: &str, doc: &Document) -> Value {
    let mut json = doc.to_json();
    if let Value::Object(map) = &mut json {
        if !map.contains_key("$id") {
            let at = usize::from(map.contains_key("$schema"));
            map.shift_insert(at, "$id".to_string(), Value::from(format!("{}.json", name)));
        }
    }
    json
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("names", &self.names())
            .field("options", &self.options)
            .finish()
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Attempted to register a document with a name that already exists.
    #[error("schema '{0}' already registered")]
    DuplicateName(String),

    /// Attempted to validate with a name that doesn't exist.
    #[error("schema '{0}' not found")]
    SchemaNotFound(String),

    /// The JSON handed to [`SchemaRegistry::register_json`] is not a valid schema.
    #[error("schema '{name}': {source}")]
    InvalidSchema {
        name: String,
        #[source]
        source: InvalidSchema,
    },

    /// Evaluation of a named document could not complete.
    #[error("schema '{name}': {source}")]
    Evaluation {
        name: String,
        #[source]
        source: EvaluationError,
    },
}
