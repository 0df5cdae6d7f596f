//! CLI module for the crosscheck harness
//!
//! Running `crosscheck` with no arguments runs the whole corpus with the stock configuration:
//! every `.ts` fixture in `integration/tests`, compiled by `zig-out/bin/glinka` and by the
//! TypeScript transpiler, executed with `node`.
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros. Every flag is optional and overrides
//! the matching `CROSSCHECK_*` environment variable. `execute` returns `CliResult<ExitCode>` instead
//! of calling `process::exit`; only the top-level `run()` exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use crate::compiler::{CommandTranslator, ReferenceAdapter, SubjectAdapter};
use crate::config::{CommandSpec, HarnessConfig};
use crate::error::HarnessError;
use crate::orchestrator::Orchestrator;
use crate::process::ProcessOptions;
use crate::reporter::ConsoleReporter;
use crate::sandbox::ExecutionSandbox;
use crate::{corpus, json_report};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// At least one fixture failed.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The harness itself could not run (unreadable corpus, bad configuration).
    pub const FATAL: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a fatal error (exit code 2).
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FATAL)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<HarnessError> for CliError {
    fn from(err: HarnessError) -> Self {
        CliError::fatal(format!("error: {err}"))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Differential tester: compile each fixture with the reference and subject compilers,
/// run both results, and compare their output.
#[derive(Parser, Debug, Default)]
#[command(name = "crosscheck")]
#[command(version)]
#[command(about = "Differential test harness for the subject compiler", long_about = None)]
pub struct Cli {
    /// Directory containing fixtures
    #[arg(long = "tests", value_name = "DIR")]
    pub tests_dir: Option<PathBuf>,

    /// Fixture file extension
    #[arg(long = "ext", value_name = "EXT")]
    pub extension: Option<String>,

    /// Subject compiler command (source on stdin, program on stdout)
    #[arg(long, value_name = "CMD")]
    pub subject: Option<String>,

    /// Runtime command (program on stdin)
    #[arg(long, value_name = "CMD")]
    pub runtime: Option<String>,

    /// Reference translator command (source on stdin, program on stdout)
    #[arg(long, value_name = "CMD")]
    pub reference: Option<String>,

    /// Kill any compiler or program run (reference translator included) that exceeds this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Maximum number of fixtures in flight
    #[arg(short, long, value_name = "N", value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    pub jobs: Option<usize>,

    /// Append table frames instead of clearing the screen
    #[arg(long)]
    pub no_redraw: bool,

    /// Write a JSON report of every fixture to FILE
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,
}

impl Cli {
    /// Apply flags on top of `config`.
    pub fn apply(self, mut config: HarnessConfig) -> CliResult<HarnessConfig> {
        if let Some(dir) = self.tests_dir {
            config = config.with_tests_dir(dir);
        }
        if let Some(ext) = &self.extension {
            config = config.with_extension(ext);
        }
        if let Some(line) = &self.subject {
            config = config.with_subject(CommandSpec::parse(line)?);
        }
        if let Some(line) = &self.runtime {
            config = config.with_runtime(CommandSpec::parse(line)?);
        }
        if let Some(line) = &self.reference {
            config = config.with_reference(CommandSpec::parse(line)?);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Some(Duration::from_secs(secs)));
        }
        if let Some(jobs) = self.jobs {
            config = config.with_jobs(Some(jobs));
        }
        if self.no_redraw {
            config = config.with_redraw(false);
        }
        if self.json.is_some() {
            config = config.with_json_report(self.json);
        }
        Ok(config)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called.
pub async fn run() {
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Resolve configuration, run the corpus, report, and derive the exit code.
pub async fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.apply(HarnessConfig::from_env()?)?;
    run_harness(&config).await
}

/// Run the whole corpus described by `config`, reporting to stdout.
pub async fn run_harness(config: &HarnessConfig) -> CliResult<ExitCode> {
    let mut reporter = ConsoleReporter::stdout(config.redraw);
    run_harness_with(config, &mut reporter).await
}

/// Run the whole corpus described by `config`, reporting through `reporter`.
///
/// The summary is always written before the JSON report. A report that cannot be written is
/// fatal only for a run that otherwise passed; a failing run keeps exit code 1.
pub async fn run_harness_with<W: Write>(
    config: &HarnessConfig,
    reporter: &mut ConsoleReporter<W>,
) -> CliResult<ExitCode> {
    let cases = corpus::scan(&config.tests_dir, &config.extension)?;

    let limits = ProcessOptions::default().with_timeout(config.timeout);
    let orchestrator = Orchestrator::new(
        ReferenceAdapter::new(CommandTranslator::new(config.reference.clone()).with_timeout(config.timeout)),
        SubjectAdapter::new(config.subject.clone()).with_options(limits),
        ExecutionSandbox::new(config.runtime.clone()).with_timeout(config.timeout),
    )
    .with_jobs(config.jobs);

    let outcomes = orchestrator.run(cases, &mut *reporter).await;
    let exit_code = reporter
        .finalize(&outcomes)
        .map_err(|e| CliError::fatal(format!("error: cannot write summary: {e}")))?;

    if let Some(path) = &config.json_report {
        match json_report::write_report(path, &outcomes) {
            Ok(()) => {}
            Err(err) if exit_code == ExitCode::SUCCESS => return Err(err.into()),
            Err(err) => {
                tracing::error!(%err, "failed to write JSON report");
                eprintln!("error: {err}");
            }
        }
    }

    tracing::info!(exit_code = exit_code.0, "run complete");
    Ok(exit_code)
}

// ============================================================================
// Tests
// ============================================================================
