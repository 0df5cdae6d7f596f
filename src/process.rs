//! Spawn, feed, await, collect.
//!
//! Every external program the harness talks to (subject compiler, runtime, command-backed reference
//! translator) is driven the same way: spawn it with piped stdio, write the whole input to stdin, close
//! stdin, wait for exit, and collect stdout/stderr. Failures never escape as `Err`; they are
//! reported in [`ProcessOutput::error`].

use std::borrow::Cow;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ExitStatus, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crosscheck_core::ProcessError;
use tokio::io::AsyncWriteExt;

use crate::config::CommandSpec;

/// Environment variables passed through to isolated processes.
const PRESERVED_ENV: &[&str] = &["PATH", "SystemRoot"];

/// How often the blocking runner checks a child against its deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a child process is launched.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Kill the child and report [`ProcessError::TimedOut`] after this long
    pub timeout: Option<Duration>,
    pub working_dir: Option<PathBuf>,
    /// Start from an empty environment (plus `PATH`)
    pub isolate_env: bool,
}

impl ProcessOptions {
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Captured result of one child process.
///
/// `stdout` is kept as raw bytes; stderr is only ever displayed, so it is decoded lossily.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub status: Option<i32>,
    pub error: Option<ProcessError>,
}

impl ProcessOutput {
    fn failed(error: ProcessError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    fn timed_out(command: &CommandSpec, limit: Duration) -> Self {
        tracing::warn!(program = %command.program, ?limit, "process timed out");
        Self::failed(ProcessError::TimedOut {
            program: command.program.clone(),
            after: limit,
        })
    }

    /// Standard output with invalid UTF-8 replaced.
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    fn collect(command: &CommandSpec, output: io::Result<Output>, fed: io::Result<()>) -> Self {
        let output = match output {
            Ok(output) => output,
            Err(err) => {
                return Self::failed(ProcessError::Wait {
                    program: command.program.clone(),
                    message: err.to_string(),
                });
            }
        };

        let mut error = exit_error(command, output.status);
        if let Err(err) = fed {
            // A child that exits without draining stdin closes the pipe; its exit status tells the story.
            if err.kind() == io::ErrorKind::BrokenPipe {
                tracing::debug!(program = %command.program, "child closed stdin early");
            } else if error.is_none() {
                error = Some(ProcessError::Stdin {
                    program: command.program.clone(),
                    message: err.to_string(),
                });
            }
        }

        Self {
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            stdout: output.stdout,
            status: output.status.code(),
            error,
        }
    }
}

fn exit_error(command: &CommandSpec, status: ExitStatus) -> Option<ProcessError> {
    if status.success() {
        return None;
    }
    Some(match status.code() {
        Some(code) => ProcessError::Exit {
            program: command.program.clone(),
            code,
        },
        None => ProcessError::Signal {
            program: command.program.clone(),
        },
    })
}

fn spawn_error(command: &CommandSpec, err: &io::Error) -> ProcessError {
    ProcessError::Spawn {
        program: command.program.clone(),
        message: err.to_string(),
    }
}

/// Apply working directory and environment isolation to either flavor of `Command`.
macro_rules! configure {
    ($cmd:expr, $command:expr, $options:expr) => {{
        $cmd.args(&$command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &$options.working_dir {
            $cmd.current_dir(dir);
        }
        if $options.isolate_env {
            $cmd.env_clear();
            for key in PRESERVED_ENV {
                if let Some(value) = std::env::var_os(key) {
                    $cmd.env(key, value);
                }
            }
        }
    }};
}

/// Run `command` with `input` on stdin and wait for it to finish.
#[tracing::instrument(skip_all, fields(program = %command.program, input_len = input.len()))]
pub async fn run_with_stdin(command: &CommandSpec, input: &str, options: &ProcessOptions) -> ProcessOutput {
    let mut cmd = tokio::process::Command::new(&command.program);
    configure!(cmd, command, options);
    cmd.kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => return ProcessOutput::failed(spawn_error(command, &err)),
    };
    tracing::debug!(pid = child.id(), "spawned");

    let stdin = child.stdin.take();
    let feed = async move {
        if let Some(mut stdin) = stdin {
            stdin.write_all(input.as_bytes()).await?;
            // Dropping the handle closes the pipe
            drop(stdin);
        }
        Ok::<(), io::Error>(())
    };
    let run = async { tokio::join!(feed, child.wait_with_output()) };

    let (fed, output) = match options.timeout {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(finished) => finished,
            // The child was owned by the dropped future; `kill_on_drop` reaps it.
            Err(_) => return ProcessOutput::timed_out(command, limit),
        },
        None => run.await,
    };

    let collected = ProcessOutput::collect(command, output, fed);
    tracing::debug!(status = ?collected.status, stdout_len = collected.stdout.len(), "exited");
    collected
}

/// Blocking counterpart of [`run_with_stdin`] for synchronous callers such as translators.
pub fn run_with_stdin_blocking(command: &CommandSpec, input: &str, options: &ProcessOptions) -> ProcessOutput {
    let mut cmd = std::process::Command::new(&command.program);
    configure!(cmd, command, options);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => return ProcessOutput::failed(spawn_error(command, &err)),
    };

    // Feed and drain on separate threads so a chatty child cannot deadlock on a full pipe.
    let writer = child.stdin.take().map(|mut stdin| {
        let input = input.to_owned();
        thread::spawn(move || stdin.write_all(input.as_bytes()))
    });
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = match options.timeout {
        Some(limit) => match wait_until(&mut child, Instant::now() + limit) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => return ProcessOutput::timed_out(command, limit),
            Err(err) => Err(err),
        },
        None => child.wait(),
    };

    let output = status.and_then(|status| {
        Ok(Output {
            status,
            stdout: join_drained(stdout)?,
            stderr: join_drained(stderr)?,
        })
    });
    let fed = match writer {
        Some(handle) => handle
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdin writer thread panicked"))),
        None => Ok(()),
    };

    ProcessOutput::collect(command, output, fed)
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_drained(handle: Option<JoinHandle<io::Result<Vec<u8>>>>) -> io::Result<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("output reader thread panicked"))),
        None => Ok(Vec::new()),
    }
}

/// Wait for `child` until `deadline`. Returns `Ok(None)` after killing a child that overran it.
fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            if let Err(err) = child.kill() {
                tracing::debug!(%err, "failed to kill overdue child");
            }
            // Reap it; the drain threads finish once the pipes close.
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
