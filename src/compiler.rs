//! Compiler adapters.
//!
//! Both compilers sit behind the same [`Compiler`] capability so the orchestrator can drive them
//! uniformly. Neither adapter ever returns an error: every failure mode is recorded in the
//! [`CompilationResult`] it produces.
//!
//! - [`ReferenceAdapter`] wraps a synchronous, trusted [`Translator`] and runs it off the async
//!   executor.
//! - [`SubjectAdapter`] drives the compiler under test as a child process, one process per call.

use std::future::Future;
use std::sync::Arc;

use crosscheck_core::{CompilationResult, ProcessError};
use thiserror::Error;

use crate::config::CommandSpec;
use crate::process::{self, ProcessOptions};

/// Turn fixture source text into program text.
pub trait Compiler: Send + Sync + 'static {
    fn compile(&self, source: &str) -> impl Future<Output = CompilationResult> + Send;
}

/// Error raised by a [`Translator`].
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TranslateError {
    message: String,
}

impl TranslateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Synchronous source-to-source translation, the trusted baseline.
pub trait Translator: Send + Sync + 'static {
    fn translate(&self, source: &str) -> Result<String, TranslateError>;
}

impl<F> Translator for F
where
    F: Fn(&str) -> Result<String, TranslateError> + Send + Sync + 'static,
{
    fn translate(&self, source: &str) -> Result<String, TranslateError> {
        self(source)
    }
}

/// Reference side: a trusted translator called synchronously.
pub struct ReferenceAdapter<T> {
    translator: Arc<T>,
}

impl<T: Translator> ReferenceAdapter<T> {
    pub fn new(translator: T) -> Self {
        Self {
            translator: Arc::new(translator),
        }
    }
}

impl<T: Translator> Compiler for ReferenceAdapter<T> {
    async fn compile(&self, source: &str) -> CompilationResult {
        let translator = Arc::clone(&self.translator);
        let source = source.to_owned();

        // Translation is blocking work; keep it off the executor threads that drive child processes.
        match tokio::task::spawn_blocking(move || translator.translate(&source)).await {
            Ok(Ok(code)) => CompilationResult::generated(code),
            Ok(Err(err)) => CompilationResult::failed(ProcessError::Translate(err.to_string())),
            Err(join) => CompilationResult::failed(ProcessError::Aborted(join.to_string())),
        }
    }
}

/// A [`Translator`] backed by a stdin-to-stdout transpiler command.
///
/// The command must exit zero and stay silent on stderr; anything else is a translation failure.
/// With a timeout set, an overrunning command is killed and reported as a failure.
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    command: CommandSpec,
    options: ProcessOptions,
}

impl CommandTranslator {
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            options: ProcessOptions::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Option<std::time::Duration>) -> Self {
        self.options.timeout = timeout;
        self
    }
}

impl Translator for CommandTranslator {
    fn translate(&self, source: &str) -> Result<String, TranslateError> {
        let output = process::run_with_stdin_blocking(&self.command, source, &self.options);
        match output.error {
            Some(err) if output.stderr.is_empty() => Err(TranslateError::new(err.to_string())),
            Some(err) => Err(TranslateError::new(format!("{err}\n{}", output.stderr))),
            None if !output.stderr.is_empty() => Err(TranslateError::new(output.stderr)),
            None => Ok(output.stdout_text().into_owned()),
        }
    }
}

/// Subject side: the compiler under test, run as a child process.
#[derive(Debug, Clone)]
pub struct SubjectAdapter {
    command: CommandSpec,
    options: ProcessOptions,
}

impl SubjectAdapter {
    pub fn new(command: CommandSpec) -> Self {
        Self {
            command,
            options: ProcessOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ProcessOptions) -> Self {
        self.options = options;
        self
    }
}

impl Compiler for SubjectAdapter {
    async fn compile(&self, source: &str) -> CompilationResult {
        let output = process::run_with_stdin(&self.command, source, &self.options).await;
        let generated_code = output.stdout_text().into_owned();
        CompilationResult {
            generated_code,
            process_error: output.error,
            stderr_text: output.stderr,
            exit_status: output.status,
        }
    }
}
