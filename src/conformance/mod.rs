//! Conformance harness for the official JSON Schema test-suite format.
//!
//! A fixture file holds `[{description, schema, tests: [{description, data,
//! valid}]}]` records. Each schema is parsed with [`ParseOptions::lenient`],
//! each `data` is validated, and the outcome is compared to `valid`.
//!
//! The harness treats `format` as an annotation, which is the draft 2020-12
//! default and what the main suite files expect. The optional `format/*.json`
//! files assert formats; run them with a harness built from
//! [`ValidationOptions::default`].
//!
//! Evaluation errors are classified rather than counted as answers:
//! [`EvaluationError::NotYetImplemented`] on an expected-valid case is an
//! engine [`Outcome::Gap`], on an expected-invalid case a [`Outcome::Skipped`]
//! case. Neither ever counts as a pass.
//!
//! Groups are evaluated in parallel with `rayon`.

mod loading;

use std::fmt::{self, Display};
use std::path::Path;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use stillwater::prelude::*;
use tracing::{debug, info};

pub use loading::{
    fixture_files, read_fixture, FileSystem, HarnessError, StdFileSystem, TestCase, TestGroup,
};

use crate::document::Document;
use crate::error::EvaluationError;
use crate::parser::ParseOptions;
use crate::validator::{ValidationOptions, Validator};

/// The result of one test case.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The engine agreed with the recorded `valid` flag.
    Passed,
    /// The engine disagreed, or could not parse or evaluate the schema.
    Failed(String),
    /// Expected invalid, but the schema uses an unsupported feature.
    Skipped(String),
    /// Expected valid, but the schema uses an unsupported feature.
    Gap(String),
}

/// One evaluated test case.
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub group: String,
    pub description: String,
    pub outcome: Outcome,
}

/// Outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub gaps: usize,
}

impl Tally {
    fn of(outcome: &Outcome) -> Self {
        let mut tally = Tally::default();
        match outcome {
            Outcome::Passed => tally.passed = 1,
            Outcome::Failed(_) => tally.failed = 1,
            Outcome::Skipped(_) => tally.skipped = 1,
            Outcome::Gap(_) => tally.gaps = 1,
        }
        tally
    }

    /// Total number of cases.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.gaps
    }
}

impl Semigroup for Tally {
    fn combine(self, other: Self) -> Self {
        Tally {
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
            skipped: self.skipped + other.skipped,
            gaps: self.gaps + other.gaps,
        }
    }
}

impl Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped, {} gaps",
            self.passed, self.failed, self.skipped, self.gaps
        )
    }
}

/// Results for one fixture file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: String,
    pub cases: Vec<CaseResult>,
}

impl FileReport {
    /// Counts the outcomes of this file.
    pub fn tally(&self) -> Tally {
        self.cases
            .iter()
            .map(|case| Tally::of(&case.outcome))
            .fold(Tally::default(), Semigroup::combine)
    }
}

/// Results for a whole fixture directory.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub files: Vec<FileReport>,
}

impl SuiteReport {
    /// Counts the outcomes of every file.
    pub fn tally(&self) -> Tally {
        self.files
            .iter()
            .map(FileReport::tally)
            .fold(Tally::default(), Semigroup::combine)
    }

    /// Returns every failed case with the file it belongs to.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &CaseResult)> {
        self.files.iter().flat_map(|file| {
            file.cases
                .iter()
                .filter(|case| matches!(case.outcome, Outcome::Failed(_)))
                .map(move |case| (file.file.as_str(), case))
        })
    }

    /// Records the current pass counts as a baseline.
    pub fn to_baseline(&self) -> Baseline {
        Baseline {
            passed: self
                .files
                .iter()
                .map(|file| (file.file.clone(), file.tally().passed))
                .collect(),
        }
    }

    /// Fails if any file passes fewer cases than the baseline pins.
    ///
    /// A pinned file that is missing from the report counts as zero passes.
    pub fn check_baseline(&self, baseline: &Baseline) -> Result<(), HarnessError> {
        let actual: IndexMap<&str, usize> = self
            .files
            .iter()
            .map(|file| (file.file.as_str(), file.tally().passed))
            .collect();

        let regressions = baseline
            .passed
            .iter()
            .filter_map(|(file, &expected)| {
                let passed = actual.get(file.as_str()).copied().unwrap_or(0);
                (passed < expected).then(|| HarnessError::Regression {
                    file: file.clone(),
                    expected,
                    actual: passed,
                })
            })
            .collect();

        HarnessError::collect(regressions)
    }
}

/// Pinned pass counts per fixture file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub passed: IndexMap<String, usize>,
}

impl Baseline {
    /// Reads a baseline file.
    pub fn load<F: FileSystem>(fs: &F, path: &Path) -> Result<Self, HarnessError> {
        let content = fs
            .read_file(path)
            .map_err(|e| HarnessError::Io(path.to_path_buf(), Box::new(e)))?;
        serde_json::from_str(&content).map_err(|e| HarnessError::Parse(path.to_path_buf(), e))
    }

    /// Renders the baseline as pretty JSON.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Runs fixture groups against the engine.
///
/// Defaults to lenient parsing and `format` as an annotation.
#[derive(Debug, Clone)]
pub struct Harness {
    parse_options: ParseOptions,
    options: ValidationOptions,
}

impl Default for Harness {
    fn default() -> Self {
        Self {
            parse_options: ParseOptions::lenient(),
            options: ValidationOptions::default().with_format_assertion(false),
        }
    }
}

impl Harness {
    /// Creates a harness with lenient parsing that does not assert `format`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parse options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }

    /// Sets the validation options.
    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs every group of one fixture file.
    pub fn run_groups(&self, file: impl Into<String>, groups: &[TestGroup]) -> FileReport {
        let cases = groups
            .par_iter()
            .map(|group| self.run_group(group))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();
        FileReport {
            file: file.into(),
            cases,
        }
    }

    /// Runs every fixture file of a directory.
    pub fn run_dir<F: FileSystem>(&self, fs: &F, dir: &Path) -> Result<SuiteReport, HarnessError> {
        let mut report = SuiteReport::default();
        for path in fixture_files(fs, dir)? {
            let groups = read_fixture(fs, &path)?;
            let file = self.run_groups(loading::file_label(&path)?, &groups);
            debug!(file = %file.file, tally = %file.tally(), "ran fixture file");
            report.files.push(file);
        }
        info!(dir = %dir.display(), tally = %report.tally(), "conformance run finished");
        Ok(report)
    }

    fn run_group(&self, group: &TestGroup) -> Vec<CaseResult> {
        let result = |case: &TestCase, outcome| CaseResult {
            group: group.description.clone(),
            description: case.description.clone(),
            outcome,
        };

        let document = match Document::from_json_with(&group.schema, self.parse_options) {
            Ok(document) => document,
            Err(e) => {
                return group
                    .tests
                    .iter()
                    .map(|case| result(case, Outcome::Failed(format!("schema rejected: {}", e))))
                    .collect()
            }
        };

        let validator = Validator::new(&document).with_options(self.options);
        group
            .tests
            .iter()
            .map(|case| result(case, classify(case.valid, validator.is_valid(&case.data))))
            .collect()
    }
}

fn classify(expected: bool, actual: Result<bool, EvaluationError>) -> Outcome {
    match actual {
        Ok(valid) if valid == expected => Outcome::Passed,
        Ok(valid) => Outcome::Failed(format!("expected valid={}, got valid={}", expected, valid)),
        Err(e) if e.is_not_yet_implemented() && expected => Outcome::Gap(e.to_string()),
        Err(e) if e.is_not_yet_implemented() => Outcome::Skipped(e.to_string()),
        Err(e) => Outcome::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::loading::tests::MockFileSystem;
    use super::*;
    use crate::path::JsonPointer;

    const TYPE_FIXTURE: &str = r#"[
        {
            "description": "integer type",
            "schema": {"type": "integer"},
            "tests": [
                {"description": "an integer", "data": 1, "valid": true},
                {"description": "a whole float", "data": 1.0, "valid": true},
                {"description": "a string", "data": "1", "valid": false}
            ]
        },
        {
            "description": "unsupported keyword",
            "schema": {"unevaluatedProperties": false},
            "tests": [
                {"description": "empty object", "data": {}, "valid": true},
                {"description": "extra property", "data": {"a": 1}, "valid": false}
            ]
        }
    ]"#;

    #[test]
    fn test_classify() {
        let nyi = || EvaluationError::NotYetImplemented {
            feature: "unevaluatedProperties".to_string(),
            location: JsonPointer::root(),
        };
        assert_eq!(classify(true, Ok(true)), Outcome::Passed);
        assert!(matches!(classify(true, Ok(false)), Outcome::Failed(_)));
        assert!(matches!(classify(true, Err(nyi())), Outcome::Gap(_)));
        assert!(matches!(classify(false, Err(nyi())), Outcome::Skipped(_)));
    }

    #[test]
    fn test_run_dir_tallies_outcomes() {
        let mut fs = MockFileSystem::new();
        fs.add_file("type.json", TYPE_FIXTURE);

        let report = Harness::new().run_dir(&fs, Path::new(".")).unwrap();
        assert_eq!(
            report.tally(),
            Tally {
                passed: 3,
                failed: 0,
                skipped: 1,
                gaps: 1
            }
        );
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_format_is_an_annotation_by_default() {
        let groups: Vec<TestGroup> = serde_json::from_str(
            r#"[{"description": "email format", "schema": {"format": "email"},
                 "tests": [{"description": "not an email", "data": "2962", "valid": true}]}]"#,
        )
        .unwrap();

        let report = Harness::new().run_groups("format.json", &groups);
        assert_eq!(report.tally().passed, 1);

        let asserting = Harness::new().with_options(ValidationOptions::default());
        assert_eq!(asserting.run_groups("format.json", &groups).tally().failed, 1);
    }

    #[test]
    fn test_rejected_schema_fails_every_case() {
        let groups: Vec<TestGroup> = serde_json::from_str(
            r#"[{"description": "bad", "schema": {"minLength": -1},
                 "tests": [{"description": "x", "data": "", "valid": true}]}]"#,
        )
        .unwrap();
        let report = Harness::new().run_groups("bad.json", &groups);
        assert_eq!(report.tally().failed, 1);
    }

    #[test]
    fn test_baseline_regression() {
        let mut fs = MockFileSystem::new();
        fs.add_file("type.json", TYPE_FIXTURE);
        let report = Harness::new().run_dir(&fs, Path::new(".")).unwrap();

        let baseline = report.to_baseline();
        assert_eq!(baseline.passed.get("type.json"), Some(&3));
        assert!(report.check_baseline(&baseline).is_ok());

        let mut raised = baseline.clone();
        raised.passed.insert("type.json".to_string(), 4);
        raised.passed.insert("ref.json".to_string(), 1);
        match report.check_baseline(&raised).unwrap_err() {
            HarnessError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected two regressions, got {}", other),
        }
    }

    #[test]
    fn test_baseline_load() {
        let mut fs = MockFileSystem::new();
        fs.add_file("_baseline.json", r#"{"passed": {"type.json": 3}}"#);
        let baseline = Baseline::load(&fs, Path::new("_baseline.json")).unwrap();
        assert_eq!(baseline.passed.get("type.json"), Some(&3));
    }
}
