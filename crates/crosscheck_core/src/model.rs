//! Data observed during a differential run.
//!
//! Every type here is a plain value: produced once by an adapter, sandbox or orchestrator task and
//! never mutated afterwards, except [`TestOutcome`], which moves through its state machine exactly once.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::verdict::{FailureKind, Verdict};

/// One fixture discovered in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub file_name: String,
    pub source_text: String,
}

impl TestCase {
    pub fn new(file_name: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            source_text: source_text.into(),
        }
    }
}

/// Which side of the comparison a pipeline belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pipeline {
    Reference,
    Subject,
}

impl Pipeline {
    pub fn as_str(self) -> &'static str {
        match self {
            Pipeline::Reference => "reference",
            Pipeline::Subject => "subject",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-level failure of a compiler or runtime invocation.
///
/// Messages are captured as strings so results stay `Clone` and comparable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    #[error("failed to spawn `{program}`: {message}")]
    Spawn { program: String, message: String },

    #[error("failed to write input to `{program}`: {message}")]
    Stdin { program: String, message: String },

    #[error("failed waiting for `{program}`: {message}")]
    Wait { program: String, message: String },

    #[error("`{program}` exited with status {code}")]
    Exit { program: String, code: i32 },

    #[error("`{program}` was terminated by a signal")]
    Signal { program: String },

    #[error("`{program}` timed out after {}ms and was killed", .after.as_millis())]
    TimedOut { program: String, after: Duration },

    #[error("translation failed: {0}")]
    Translate(String),

    #[error("pipeline task aborted: {0}")]
    Aborted(String),
}

/// What a compiler produced for one fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationResult {
    pub generated_code: String,
    pub process_error: Option<ProcessError>,
    pub stderr_text: String,
    pub exit_status: Option<i32>,
}

impl CompilationResult {
    /// A successful in-process translation: code only, no process-level fields.
    pub fn generated(code: impl Into<String>) -> Self {
        Self {
            generated_code: code.into(),
            ..Self::default()
        }
    }

    /// A compilation that never produced usable output.
    pub fn failed(error: ProcessError) -> Self {
        Self {
            process_error: Some(error),
            ..Self::default()
        }
    }

    /// No process error and no diagnostic text: the generated code may be executed.
    pub fn is_clean(&self) -> bool {
        self.process_error.is_none() && self.stderr_text.is_empty()
    }
}

/// What the runtime observed while executing generated code.
///
/// Standard output is kept as raw bytes; it is the comparison oracle and must not be decoded first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: Vec<u8>,
    pub stderr_text: String,
    pub process_error: Option<ProcessError>,
    pub exit_status: Option<i32>,
}

impl ExecutionResult {
    pub fn failed(error: ProcessError) -> Self {
        Self {
            process_error: Some(error),
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        self.process_error.is_none() && self.stderr_text.is_empty()
    }

    /// Standard output for display, with invalid UTF-8 replaced.
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }
}

/// Compile-then-execute results for one compiler on one fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineResult {
    pub compilation: CompilationResult,
    pub execution: Option<ExecutionResult>,
}

impl PipelineResult {
    pub fn new(compilation: CompilationResult, execution: Option<ExecutionResult>) -> Self {
        Self { compilation, execution }
    }

    /// The most telling text this pipeline produced.
    ///
    /// Looks at the execution when one ran, otherwise at the compilation, and prefers the process
    /// error, then non-empty stderr, then stdout.
    pub fn observed_output(&self) -> String {
        match &self.execution {
            Some(run) => pick_output(run.process_error.as_ref(), &run.stderr_text, &run.stdout_text()),
            None => pick_output(
                self.compilation.process_error.as_ref(),
                &self.compilation.stderr_text,
                &self.compilation.generated_code,
            ),
        }
    }
}

fn pick_output(error: Option<&ProcessError>, stderr: &str, stdout: &str) -> String {
    match error {
        Some(err) if stderr.is_empty() => err.to_string(),
        Some(err) => format!("{err}\n{stderr}"),
        None if !stderr.is_empty() => stderr.to_string(),
        None => stdout.to_string(),
    }
}

/// Lifecycle of one fixture: `Pending -> Running -> {Success, Failure}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestStatus {
    #[default]
    Pending,
    Running,
    Success,
    Failure,
}

impl TestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TestStatus::Success | TestStatus::Failure)
    }

    pub fn label(self) -> &'static str {
        match self {
            TestStatus::Pending => "\u{00b7} Pending",
            TestStatus::Running => "\u{2026} Running",
            TestStatus::Success => "\u{2714} Success",
            TestStatus::Failure => "\u{2715} Failure",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The recorded verdict and captured artifacts for one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub file_name: String,
    pub status: TestStatus,
    pub failure: Option<FailureKind>,
    pub reference: Option<PipelineResult>,
    pub subject: Option<PipelineResult>,
}

impl TestOutcome {
    pub fn pending(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: TestStatus::Pending,
            failure: None,
            reference: None,
            subject: None,
        }
    }

    /// Move `Pending -> Running`. Returns `false` if the outcome was not pending.
    pub fn start(&mut self) -> bool {
        if self.status != TestStatus::Pending {
            return false;
        }
        self.status = TestStatus::Running;
        true
    }

    /// Record the terminal verdict. Returns `false` (and changes nothing) if already terminal.
    pub fn complete(&mut self, verdict: Verdict, reference: PipelineResult, subject: PipelineResult) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        match verdict {
            Verdict::Success => {
                self.status = TestStatus::Success;
                self.failure = None;
            }
            Verdict::Failure(kind) => {
                self.status = TestStatus::Failure;
                self.failure = Some(kind);
            }
        }
        self.reference = Some(reference);
        self.subject = Some(subject);
        true
    }

    /// Fail a fixture whose pipelines never reported back.
    pub fn abort(&mut self, message: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TestStatus::Failure;
        self.failure = Some(FailureKind::Aborted {
            message: message.into(),
        });
        true
    }

    pub fn is_failure(&self) -> bool {
        self.status == TestStatus::Failure
    }
}
