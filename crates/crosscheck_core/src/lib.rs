//! Provide the pure data model and verdict policy for the crosscheck harness.
//!
//! This crate is intentionally small and dependency-light. It describes what a differential run
//! observes (compilations, executions, per-fixture outcomes) and decides whether two pipelines agree.
//!
//! ## Notes
//!
//! - **No IO** and no async runtime: process spawning, scheduling and rendering live in the `crosscheck` crate.
//! - The only oracle is runtime standard output. Generated code is carried along for diagnosis but never compared.

pub mod model;
pub mod verdict;

pub use model::{
    CompilationResult, ExecutionResult, Pipeline, PipelineResult, ProcessError, TestCase, TestOutcome, TestStatus,
};
pub use verdict::{FailureKind, Verdict, decide};
