#![forbid(unsafe_code)]
//! Crosscheck: differential testing for a source-to-source compiler
//!
//! Every fixture in a corpus is compiled twice, once by a trusted reference translator and once by
//! the compiler under test (the "subject"). Both programs run under the same runtime and the fixture
//! passes only when their standard output is byte-for-byte identical.
//!
//! ## Pipeline
//!
//! ```text
//! corpus::scan -> Orchestrator (one task per fixture)
//!                   ├─ ReferenceAdapter::compile -> ExecutionSandbox::run
//!                   └─ SubjectAdapter::compile   -> ExecutionSandbox::run
//!                 -> crosscheck_core::decide -> ProgressSink -> summary + exit code
//! ```
//!
//! ## Panic Policy
//!
//! - **Production code**: failures inside a fixture are data (`ProcessError` on the result), never
//!   panics or `Err`. Fatal problems (unreadable corpus, bad configuration) are `HarnessError`.
//!   The `cli` module enforces `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

pub mod cli;
pub mod compiler;
pub mod config;
pub mod corpus;
pub mod error;
pub mod json_report;
pub mod orchestrator;
pub mod process;
pub mod reporter;
pub mod sandbox;

pub use crosscheck_core::{
    CompilationResult, ExecutionResult, FailureKind, Pipeline, PipelineResult, ProcessError, TestCase, TestOutcome,
    TestStatus, Verdict, decide,
};

pub use compiler::{CommandTranslator, Compiler, ReferenceAdapter, SubjectAdapter, TranslateError, Translator};
pub use config::{CommandSpec, HarnessConfig};
pub use error::{HarnessError, HarnessResult};
pub use orchestrator::Orchestrator;
pub use reporter::{ConsoleReporter, ProgressSink, Tally};
pub use sandbox::{ExecutionSandbox, Runtime};
