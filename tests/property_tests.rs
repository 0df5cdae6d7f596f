//! Property-based tests for the crosscheck verdict policy
//!
//! These tests use proptest to verify the comparison rules across many randomly
//! generated pipeline results, catching edge cases that hand-written tests might miss.

use crosscheck::{
    CompilationResult, ExecutionResult, FailureKind, Pipeline, PipelineResult, ProcessError, Tally, TestOutcome,
    Verdict, decide,
};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Program output: printable lines, sometimes empty.
fn output_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[ -~]{0,12}", 0..6).prop_map(|lines| {
        lines.iter().map(|line| format!("{line}\n")).collect()
    })
}

fn code_strategy() -> impl Strategy<Value = String> {
    "[a-z(); ]{0,24}"
}

fn clean_pipeline(code: String, stdout: String) -> PipelineResult {
    PipelineResult::new(
        CompilationResult::generated(code),
        Some(ExecutionResult {
            stdout: stdout.into_bytes(),
            exit_status: Some(0),
            ..ExecutionResult::default()
        }),
    )
}

fn process_error_strategy() -> impl Strategy<Value = ProcessError> {
    prop_oneof![
        (1..255i32).prop_map(|code| ProcessError::Exit {
            program: "glinka".to_string(),
            code
        }),
        Just(ProcessError::Signal {
            program: "node".to_string()
        }),
        "[a-z ]{1,16}".prop_map(ProcessError::Translate),
    ]
}

// =============================================================================
// Verdict Properties
// =============================================================================

proptest! {
    /// Property: identical clean output always succeeds, whatever code was generated
    #[test]
    fn identical_output_succeeds(
        stdout in output_strategy(),
        reference_code in code_strategy(),
        subject_code in code_strategy(),
    ) {
        let reference = clean_pipeline(reference_code, stdout.clone());
        let subject = clean_pipeline(subject_code, stdout);
        prop_assert_eq!(decide(&reference, &subject), Verdict::Success);
    }

    /// Property: differing clean output always fails as a mismatch
    #[test]
    fn different_output_fails(
        reference_out in output_strategy(),
        subject_out in output_strategy(),
    ) {
        prop_assume!(reference_out != subject_out);
        let reference = clean_pipeline(String::new(), reference_out);
        let subject = clean_pipeline(String::new(), subject_out);
        prop_assert_eq!(decide(&reference, &subject), Verdict::Failure(FailureKind::OutputMismatch));
    }

    /// Property: the verdict is symmetric in success, whichever side is called the reference
    #[test]
    fn success_is_symmetric(a in output_strategy(), b in output_strategy()) {
        let left = decide(&clean_pipeline(String::new(), a.clone()), &clean_pipeline(String::new(), b.clone()));
        let right = decide(&clean_pipeline(String::new(), b), &clean_pipeline(String::new(), a));
        prop_assert_eq!(left.is_success(), right.is_success());
    }

    /// Property: a compilation process error fails the fixture even when outputs agree
    #[test]
    fn compilation_error_always_fails(
        stdout in output_strategy(),
        error in process_error_strategy(),
        subject_side in any::<bool>(),
    ) {
        let mut reference = clean_pipeline(String::new(), stdout.clone());
        let mut subject = clean_pipeline(String::new(), stdout);
        let broken = if subject_side { &mut subject } else { &mut reference };
        broken.compilation.process_error = Some(error);

        let pipeline = if subject_side { Pipeline::Subject } else { Pipeline::Reference };
        prop_assert_eq!(
            decide(&reference, &subject),
            Verdict::Failure(FailureKind::CompilationProcessError { pipeline })
        );
    }

    /// Property: any runtime stderr fails the fixture even when stdout agrees
    #[test]
    fn runtime_stderr_always_fails(stdout in output_strategy(), stderr in "[ -~]{1,20}") {
        let reference = clean_pipeline(String::new(), stdout.clone());
        let mut subject = clean_pipeline(String::new(), stdout);
        if let Some(run) = subject.execution.as_mut() {
            run.stderr_text = stderr;
        }
        prop_assert_eq!(
            decide(&reference, &subject),
            Verdict::Failure(FailureKind::RuntimeProcessError { pipeline: Pipeline::Subject })
        );
    }

    /// Property: the exit code is 0 iff nothing failed, and never encodes the count
    #[test]
    fn exit_code_is_binary(results in prop::collection::vec(any::<bool>(), 0..40)) {
        let outcomes: Vec<TestOutcome> = results
            .iter()
            .enumerate()
            .map(|(i, passed)| {
                let mut outcome = TestOutcome::pending(format!("{i}.ts"));
                outcome.start();
                let verdict = if *passed {
                    Verdict::Success
                } else {
                    Verdict::Failure(FailureKind::OutputMismatch)
                };
                outcome.complete(verdict, PipelineResult::default(), PipelineResult::default());
                outcome
            })
            .collect();

        let tally = Tally::from_outcomes(&outcomes);
        let failures = results.iter().filter(|passed| !**passed).count();
        prop_assert_eq!(tally.failures, failures);
        prop_assert_eq!(tally.exit_code().0, if failures == 0 { 0 } else { 1 });
    }
}
