//! Machine-readable run report.
//!
//! Written once, after the run, when `--json <FILE>` is given. The console table and summary
//! remain the human-facing output.

use std::fs;
use std::path::Path;

use crosscheck_core::{CompilationResult, ExecutionResult, PipelineResult, TestOutcome, TestStatus};
use serde_json::{Value, json};

use crate::error::{HarnessError, HarnessResult};
use crate::reporter::Tally;

fn status_name(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Pending => "pending",
        TestStatus::Running => "running",
        TestStatus::Success => "success",
        TestStatus::Failure => "failure",
    }
}

fn compilation_json(result: &CompilationResult) -> Value {
    json!({
        "generated_code": result.generated_code,
        "stderr": result.stderr_text,
        "exit_status": result.exit_status,
        "error": result.process_error.as_ref().map(ToString::to_string),
    })
}

fn execution_json(result: &ExecutionResult) -> Value {
    json!({
        "stdout": result.stdout_text(),
        "stderr": result.stderr_text,
        "exit_status": result.exit_status,
        "error": result.process_error.as_ref().map(ToString::to_string),
    })
}

fn pipeline_json(result: Option<&PipelineResult>) -> Value {
    match result {
        Some(result) => json!({
            "compilation": compilation_json(&result.compilation),
            "execution": result.execution.as_ref().map(execution_json),
        }),
        None => Value::Null,
    }
}

/// Build the report document.
pub fn to_json(outcomes: &[TestOutcome]) -> Value {
    let tally = Tally::from_outcomes(outcomes);
    let fixtures: Vec<Value> = outcomes
        .iter()
        .map(|outcome| {
            json!({
                "file": outcome.file_name,
                "status": status_name(outcome.status),
                "failure": outcome.failure.as_ref().map(ToString::to_string),
                "reference": pipeline_json(outcome.reference.as_ref()),
                "subject": pipeline_json(outcome.subject.as_ref()),
            })
        })
        .collect();

    json!({
        "total": tally.total,
        "successes": tally.successes,
        "failures": tally.failures,
        "fixtures": fixtures,
    })
}

/// Write the report to `path`, pretty-printed.
pub fn write_report(path: &Path, outcomes: &[TestOutcome]) -> HarnessResult<()> {
    let write_error = |source| HarnessError::WriteReport {
        path: path.to_path_buf(),
        source,
    };
    let mut text = serde_json::to_string_pretty(&to_json(outcomes)).map_err(|err| write_error(err.into()))?;
    text.push('\n');
    fs::write(path, text).map_err(write_error)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crosscheck_core::{FailureKind, ProcessError, Verdict};

    fn failed_outcome() -> TestOutcome {
        let mut outcome = TestOutcome::pending("types.ts");
        outcome.start();
        outcome.complete(
            Verdict::Failure(FailureKind::CompilationProcessError {
                pipeline: crosscheck_core::Pipeline::Subject,
            }),
            PipelineResult::new(
                CompilationResult::generated("console.log(4);"),
                Some(ExecutionResult {
                    stdout: b"4\n".to_vec(),
                    exit_status: Some(0),
                    ..ExecutionResult::default()
                }),
            ),
            PipelineResult::new(
                CompilationResult::failed(ProcessError::Exit {
                    program: "glinka".to_string(),
                    code: 2,
                }),
                None,
            ),
        );
        outcome
    }

    #[test]
    fn test_report_shape() {
        let report = to_json(&[failed_outcome(), TestOutcome::pending("loops.ts")]);

        assert_eq!(report["total"], 2);
        assert_eq!(report["failures"], 1);
        assert_eq!(report["fixtures"][0]["file"], "types.ts");
        assert_eq!(report["fixtures"][0]["status"], "failure");
        assert_eq!(report["fixtures"][0]["failure"], "subject compilation failed");
        assert_eq!(report["fixtures"][0]["reference"]["execution"]["stdout"], "4\n");
        assert_eq!(
            report["fixtures"][0]["subject"]["compilation"]["error"],
            "`glinka` exited with status 2"
        );
        assert!(report["fixtures"][0]["subject"]["execution"].is_null());
        assert_eq!(report["fixtures"][1]["status"], "pending");
        assert!(report["fixtures"][1]["reference"].is_null());
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_report(&path, &[failed_outcome()]).unwrap();

        let parsed: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["fixtures"][0]["file"], "types.ts");
    }

    #[test]
    fn test_write_report_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        assert!(matches!(
            write_report(&path, &[]),
            Err(HarnessError::WriteReport { .. })
        ));
    }
}
