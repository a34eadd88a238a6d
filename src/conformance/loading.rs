//! Fixture and schema loading through a filesystem abstraction.
//!
//! Loading goes through the [`FileSystem`] trait so the harness and the
//! registry loader can be tested against an in-memory filesystem.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::document::Document;
use crate::registry::{RegistryError, SchemaRegistry};
use crate::value::Value;

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// The error type for filesystem operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads the contents of a file as a string.
    fn read_file(&self, path: &Path) -> Result<String, Self::Error>;

    /// Lists all entries in a directory.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, Self::Error>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    type Error = std::io::Error;

    fn read_file(&self, path: &Path) -> Result<String, Self::Error> {
        std::fs::read_to_string(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, Self::Error> {
        std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }
}

/// Errors raised while loading fixtures, baselines or schema files.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// IO error reading a file or directory
    #[error("IO error reading {0}: {1}")]
    Io(PathBuf, Box<dyn std::error::Error + Send + Sync>),

    /// The file is not valid JSON or not in the expected shape
    #[error("Parse error in {0}: {1}")]
    Parse(PathBuf, serde_json::Error),

    /// A schema file is not a valid schema
    #[error("Schema error in {0}: {1}")]
    Schema(PathBuf, crate::error::InvalidSchema),

    /// Invalid filename
    #[error("Invalid filename: {0}")]
    InvalidFileName(PathBuf),

    /// Registry error
    #[error("Registry error: {0}")]
    Registry(RegistryError),

    /// A fixture file passed fewer cases than its pinned baseline
    #[error("{file}: {actual} cases passed, baseline is {expected}")]
    Regression {
        file: String,
        expected: usize,
        actual: usize,
    },

    /// Multiple errors occurred
    #[error("Multiple errors: {0:?}")]
    Multiple(Vec<HarnessError>),
}

impl HarnessError {
    fn io(path: &Path, e: impl std::error::Error + Send + Sync + 'static) -> Self {
        HarnessError::Io(path.to_path_buf(), Box::new(e))
    }

    /// Collapses accumulated errors: none is success, one is returned as is.
    pub(crate) fn collect(mut errors: Vec<HarnessError>) -> Result<(), HarnessError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(HarnessError::Multiple(errors)),
        }
    }
}

/// One record of a fixture file: a schema and the cases run against it.
#[derive(Debug, Clone, Deserialize)]
pub struct TestGroup {
    pub description: String,
    pub schema: Value,
    pub tests: Vec<TestCase>,
}

/// One instance and whether it is expected to be valid.
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    pub description: String,
    pub data: Value,
    pub valid: bool,
}

/// Reads one fixture file.
pub fn read_fixture<F: FileSystem>(fs: &F, path: &Path) -> Result<Vec<TestGroup>, HarnessError> {
    let content = fs.read_file(path).map_err(|e| HarnessError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| HarnessError::Parse(path.to_path_buf(), e))
}

/// Lists the `.json` files of a directory, sorted by name.
///
/// Files whose name starts with `_` (such as a baseline) are not fixtures.
pub fn fixture_files<F: FileSystem>(fs: &F, dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let mut files: Vec<PathBuf> = fs
        .read_dir(dir)
        .map_err(|e| HarnessError::io(dir, e))?
        .into_iter()
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .filter(|p| {
            p.file_name()
                .and_then(|s| s.to_str())
                .is_some_and(|name| !name.starts_with('_'))
        })
        .collect();
    files.sort();
    Ok(files)
}

pub(crate) fn file_label(path: &Path) -> Result<String, HarnessError> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| HarnessError::InvalidFileName(path.to_path_buf()))
}

impl SchemaRegistry {
    /// Loads every `.json` schema file of a directory.
    ///
    /// Each file is registered under its file stem. Errors are accumulated:
    /// every loadable file is registered even if others fail.
    pub fn load_dir<F: FileSystem>(&self, fs: &F, path: impl AsRef<Path>) -> Result<(), HarnessError> {
        let path = path.as_ref();
        let files = fs.read_dir(path).map_err(|e| HarnessError::io(path, e))?;

        let errors = files
            .iter()
            .filter(|file| file.extension().and_then(|s| s.to_str()) == Some("json"))
            .filter_map(|file| self.load_schema_file(file, fs).err())
            .collect();

        HarnessError::collect(errors)
    }

    fn load_schema_file<F: FileSystem>(&self, path: &Path, fs: &F) -> Result<(), HarnessError> {
        let content = fs.read_file(path).map_err(|e| HarnessError::io(path, e))?;

        let json: Value = content
            .parse()
            .map_err(|e| HarnessError::Parse(path.to_path_buf(), e))?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| HarnessError::InvalidFileName(path.to_path_buf()))?;

        let document = Document::from_json_with(&json, *self.parse_options())
            .map_err(|e| HarnessError::Schema(path.to_path_buf(), e))?;
        self.register(name, document).map_err(HarnessError::Registry)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug)]
    pub(crate) struct MockFileSystemError(String);

    impl std::fmt::Display for MockFileSystemError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for MockFileSystemError {}

    pub(crate) struct MockFileSystem {
        files: HashMap<PathBuf, String>,
    }

    impl MockFileSystem {
        pub(crate) fn new() -> Self {
            Self {
                files: HashMap::new(),
            }
        }

        pub(crate) fn add_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
            self.files.insert(path.into(), content.into());
        }
    }

    impl FileSystem for MockFileSystem {
        type Error = MockFileSystemError;

        fn read_file(&self, path: &Path) -> Result<String, Self::Error> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| MockFileSystemError(format!("File not found: {}", path.display())))
        }

        fn read_dir(&self, _path: &Path) -> Result<Vec<PathBuf>, Self::Error> {
            Ok(self.files.keys().cloned().collect())
        }
    }

    #[test]
    fn test_load_schemas() {
        let mut fs = MockFileSystem::new();
        fs.add_file("email.json", r#"{"type": "string", "format": "email"}"#);
        fs.add_file("age.json", r#"{"type": "integer", "minimum": 0}"#);
        fs.add_file("notes.txt", "ignored");

        let registry = SchemaRegistry::new();
        registry.load_dir(&fs, ".").unwrap();

        assert!(registry.get("email").is_some());
        assert!(registry.get("age").is_some());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_load_error_accumulation() {
        let mut fs = MockFileSystem::new();
        fs.add_file("valid.json", r#"{"type": "string"}"#);
        fs.add_file("broken.json", "not valid json");
        fs.add_file("misplaced.json", r#"{"type": "string", "minimum": 1}"#);

        let registry = SchemaRegistry::new();
        let err = registry.load_dir(&fs, ".").unwrap_err();

        match err {
            HarnessError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected multiple errors, got {}", other),
        }
        assert!(registry.get("valid").is_some());
    }

    #[test]
    fn test_read_fixture() {
        let mut fs = MockFileSystem::new();
        fs.add_file(
            "type.json",
            r#"[{
                "description": "integer type",
                "schema": {"type": "integer"},
                "tests": [
                    {"description": "an integer", "data": 1, "valid": true},
                    {"description": "a float", "data": 1.5, "valid": false}
                ]
            }]"#,
        );

        let groups = read_fixture(&fs, Path::new("type.json")).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].tests.len(), 2);
        assert!(!groups[0].tests[1].valid);
    }

    #[test]
    fn test_fixture_files_skip_underscored() {
        let mut fs = MockFileSystem::new();
        fs.add_file("b.json", "[]");
        fs.add_file("a.json", "[]");
        fs.add_file("_baseline.json", "{}");

        let files = fixture_files(&fs, Path::new(".")).unwrap();
        assert_eq!(files, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
    }

    #[test]
    fn test_std_file_system() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("s.json"), r#"{"type": "null"}"#).unwrap();

        let registry = SchemaRegistry::new();
        registry.load_dir(&StdFileSystem, dir.path()).unwrap();
        assert!(registry.get("s").is_some());
    }
}
