//! Execute generated programs under the managed runtime.

use std::future::Future;

use crosscheck_core::{ExecutionResult, ProcessError};

use crate::config::CommandSpec;
use crate::process::{self, ProcessOptions};

/// Run program text and report what it did.
pub trait Runtime: Send + Sync + 'static {
    fn run(&self, program: &str) -> impl Future<Output = ExecutionResult> + Send;
}

/// Runs each program in a fresh runtime process.
///
/// Every invocation gets its own scratch working directory (removed afterwards) and an environment
/// reduced to `PATH`, so programs cannot observe each other or the harness.
#[derive(Debug, Clone)]
pub struct ExecutionSandbox {
    command: CommandSpec,
    options: ProcessOptions,
}

impl ExecutionSandbox {
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            options: ProcessOptions {
                isolate_env: true,
                ..ProcessOptions::default()
            },
        }
    }

    pub fn with_timeout(mut self, timeout: Option<std::time::Duration>) -> Self {
        self.options.timeout = timeout;
        self
    }
}

impl Runtime for ExecutionSandbox {
    async fn run(&self, program: &str) -> ExecutionResult {
        let scratch = match tempfile::Builder::new().prefix("crosscheck-run-").tempdir() {
            Ok(dir) => dir,
            Err(err) => {
                return ExecutionResult::failed(ProcessError::Spawn {
                    program: self.command.program.clone(),
                    message: format!("cannot create scratch directory: {err}"),
                });
            }
        };

        let mut options = self.options.clone();
        options.working_dir = Some(scratch.path().to_path_buf());
        let output = process::run_with_stdin(&self.command, program, &options).await;

        if let Err(err) = scratch.close() {
            tracing::debug!(%err, "failed to remove scratch directory");
        }

        ExecutionResult {
            stdout: output.stdout,
            stderr_text: output.stderr,
            process_error: output.error,
            exit_status: output.status,
        }
    }
}
