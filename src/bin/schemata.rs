//! Schemata CLI
//!
//! Checks schema files, validates instances and runs conformance fixtures.
//!
//! Usage:
//!   schemata check schema.json
//!   schemata validate schema.json data.json [more.json ...]
//!   schemata suite tests/fixtures/draft2020-12 --baseline tests/fixtures/draft2020-12/_baseline.json

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use schemata::conformance::{Baseline, Harness, StdFileSystem};
use schemata::{Document, ParseOptions, ValidationOptions, Validator, Value};
use stillwater::Validation;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemata")]
#[command(about = "Validate JSON against draft 2020-12 JSON Schemas")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a schema and report unresolvable references
    Check {
        schema: PathBuf,

        #[command(flatten)]
        parse: ParseFlags,

        /// Print the schema back in canonical form
        #[arg(long)]
        canonical: bool,
    },

    /// Validate instance files against a schema
    Validate {
        schema: PathBuf,

        #[arg(required = true)]
        instances: Vec<PathBuf>,

        #[command(flatten)]
        parse: ParseFlags,

        #[command(flatten)]
        validation: ValidationFlags,
    },

    /// Run a directory of conformance fixtures
    Suite {
        dir: PathBuf,

        /// Fail if any file passes fewer cases than this baseline
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Write the current pass counts to this file
        #[arg(long)]
        write_baseline: Option<PathBuf>,

        /// Maximum `$ref` depth
        #[arg(long, default_value_t = schemata::validator::DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Assert `format`, as the optional format fixtures expect
        #[arg(long)]
        assert_formats: bool,

        /// List failed cases
        #[arg(long)]
        verbose: bool,
    },
}

#[derive(Args)]
struct ParseFlags {
    /// Accept misplaced keywords, unknown keywords and other drafts
    #[arg(long)]
    lenient: bool,
}

impl ParseFlags {
    fn options(&self) -> ParseOptions {
        if self.lenient {
            ParseOptions::lenient()
        } else {
            ParseOptions::strict()
        }
    }
}

#[derive(Args)]
struct ValidationFlags {
    /// Maximum `$ref` depth
    #[arg(long, default_value_t = schemata::validator::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Treat `format` as an annotation only
    #[arg(long)]
    no_format_assertion: bool,
}

impl ValidationFlags {
    fn options(&self) -> ValidationOptions {
        ValidationOptions::default()
            .with_max_depth(self.max_depth)
            .with_format_assertion(!self.no_format_assertion)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns false when the command ran but found invalid input.
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::Check {
            schema,
            parse,
            canonical,
        } => check(&schema, parse.options(), canonical),
        Command::Validate {
            schema,
            instances,
            parse,
            validation,
        } => validate(&schema, &instances, parse.options(), validation.options()),
        Command::Suite {
            dir,
            baseline,
            write_baseline,
            max_depth,
            assert_formats,
            verbose,
        } => suite(
            &dir,
            baseline.as_deref(),
            write_baseline.as_deref(),
            ValidationOptions::default()
                .with_max_depth(max_depth)
                .with_format_assertion(assert_formats),
            verbose,
        ),
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    text.parse()
        .with_context(|| format!("parsing {}", path.display()))
}

fn load_schema(path: &Path, options: ParseOptions) -> Result<Document> {
    let json = read_json(path)?;
    Document::from_json_with(&json, options).with_context(|| format!("loading {}", path.display()))
}

fn check(path: &Path, options: ParseOptions, canonical: bool) -> Result<bool> {
    let document = load_schema(path, options)?;
    let unresolved = document.unresolved_refs();

    for (pointer, reference) in &unresolved {
        println!("{}: unresolved $ref '{}' at {}", path.display(), reference, pointer);
    }
    if canonical {
        println!("{}", document.to_json().to_json_string_pretty());
    } else if unresolved.is_empty() {
        println!(
            "{}: ok ({} nodes)",
            path.display(),
            document.index().len()
        );
    }
    Ok(unresolved.is_empty())
}

fn validate(
    schema: &Path,
    instances: &[PathBuf],
    parse: ParseOptions,
    options: ValidationOptions,
) -> Result<bool> {
    let document = load_schema(schema, parse)?;
    let validator = Validator::new(&document).with_options(options);

    let mut all_valid = true;
    for path in instances {
        let value = read_json(path)?;
        let result = validator
            .validate(&value)
            .with_context(|| format!("validating {}", path.display()))?;
        match result {
            Validation::Success(()) => println!("{}: valid", path.display()),
            Validation::Failure(failure) => {
                all_valid = false;
                println!("{}: invalid", path.display());
                for error in failure.iter() {
                    println!("  {}", error);
                }
            }
        }
    }
    Ok(all_valid)
}

fn suite(
    dir: &Path,
    baseline: Option<&Path>,
    write_baseline: Option<&Path>,
    options: ValidationOptions,
    verbose: bool,
) -> Result<bool> {
    let harness = Harness::new().with_options(options);
    let report = harness.run_dir(&StdFileSystem, dir)?;

    for file in &report.files {
        println!("{:<32} {}", file.file, file.tally());
    }
    println!("{:<32} {}", "total", report.tally());

    if verbose {
        for (file, case) in report.failures() {
            println!("FAIL {} / {} / {}: {:?}", file, case.group, case.description, case.outcome);
        }
    }

    if let Some(path) = write_baseline {
        std::fs::write(path, report.to_baseline().to_json_string())
            .with_context(|| format!("writing {}", path.display()))?;
    }

    if let Some(path) = baseline {
        let pinned = Baseline::load(&StdFileSystem, path)?;
        if let Err(e) = report.check_baseline(&pinned) {
            bail!("pass count regressed against {}: {}", path.display(), e);
        }
    }
    Ok(true)
}
