//! Verdict policy: decide whether the reference and subject pipelines agree.
//!
//! ## Precedence
//!
//! 1. A process-level compilation error on either side fails the fixture.
//! 2. Non-empty subject diagnostics fail the fixture, even with a zero exit status.
//! 3. A runtime process error or non-empty runtime stderr on either side fails the fixture.
//! 4. Otherwise the fixture passes iff both runtimes wrote byte-identical stdout.
//!
//! Generated code and stderr contents are never compared between the two compilers.

use std::fmt;

use crate::model::{Pipeline, PipelineResult};

/// Why a fixture failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// A compiler could not be spawned, crashed or exited non-zero.
    CompilationProcessError { pipeline: Pipeline },
    /// The subject compiler wrote diagnostic text.
    CompilationDiagnostic,
    /// Generated code failed under the runtime or wrote to stderr.
    RuntimeProcessError { pipeline: Pipeline },
    /// Compilation looked clean but no execution was recorded.
    ExecutionSkipped { pipeline: Pipeline },
    /// Both sides ran cleanly and printed different output.
    OutputMismatch,
    /// The fixture's task ended without reporting pipeline results.
    Aborted { message: String },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::CompilationProcessError { pipeline } => write!(f, "{pipeline} compilation failed"),
            FailureKind::CompilationDiagnostic => f.write_str("subject compiler reported diagnostics"),
            FailureKind::RuntimeProcessError { pipeline } => write!(f, "{pipeline} program failed at runtime"),
            FailureKind::ExecutionSkipped { pipeline } => write!(f, "{pipeline} program was never executed"),
            FailureKind::OutputMismatch => f.write_str("standard output differs"),
            FailureKind::Aborted { message } => write!(f, "aborted: {message}"),
        }
    }
}

/// Terminal decision for one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure(FailureKind),
}

impl Verdict {
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }
}

/// Compare two completed pipelines.
pub fn decide(reference: &PipelineResult, subject: &PipelineResult) -> Verdict {
    let sides = [(Pipeline::Reference, reference), (Pipeline::Subject, subject)];

    for (pipeline, result) in sides {
        if result.compilation.process_error.is_some() {
            return Verdict::Failure(FailureKind::CompilationProcessError { pipeline });
        }
    }

    if !subject.compilation.stderr_text.is_empty() {
        return Verdict::Failure(FailureKind::CompilationDiagnostic);
    }

    let mut outputs = Vec::with_capacity(2);
    for (pipeline, result) in sides {
        let Some(run) = &result.execution else {
            return Verdict::Failure(FailureKind::ExecutionSkipped { pipeline });
        };
        if !run.is_clean() {
            return Verdict::Failure(FailureKind::RuntimeProcessError { pipeline });
        }
        outputs.push(run.stdout.as_slice());
    }

    if outputs[0] == outputs[1] {
        Verdict::Success
    } else {
        Verdict::Failure(FailureKind::OutputMismatch)
    }
}
