//! Per-fixture state machines, run concurrently.
//!
//! ## Design
//!
//! Each fixture gets its own task. The task runs the reference and subject pipelines concurrently,
//! decides the verdict, and reports back over a channel tagged with the fixture's index. The
//! orchestrator is the channel's only consumer and the only writer of the outcome list, so each slot
//! is written by exactly one fixture's updates and no lock is needed. Outcome order is always
//! discovery order, whatever order the tasks finish in.
//!
//! There is no cancellation: the run finishes when every fixture reaches a terminal status. Bound
//! individual processes with a timeout (see [`crate::process::ProcessOptions`]) to avoid hangs.

use std::sync::Arc;

use crosscheck_core::{PipelineResult, TestCase, TestOutcome, Verdict, decide};
use tokio::sync::{Semaphore, mpsc};

use crate::compiler::Compiler;
use crate::reporter::ProgressSink;
use crate::sandbox::Runtime;

/// Message from a fixture task to the orchestrator.
enum Update {
    Running(usize),
    Finished {
        index: usize,
        verdict: Verdict,
        reference: PipelineResult,
        subject: PipelineResult,
    },
}

/// Drives one reference and one subject pipeline per fixture.
pub struct Orchestrator<R, S, X> {
    reference: Arc<R>,
    subject: Arc<S>,
    runtime: Arc<X>,
    jobs: Option<usize>,
}

impl<R, S, X> Orchestrator<R, S, X>
where
    R: Compiler,
    S: Compiler,
    X: Runtime,
{
    pub fn new(reference: R, subject: S, runtime: X) -> Self {
        Self {
            reference: Arc::new(reference),
            subject: Arc::new(subject),
            runtime: Arc::new(runtime),
            jobs: None,
        }
    }

    /// Limit how many fixtures are in flight at once. `None` means unbounded.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs.map(|n| n.max(1));
        self
    }

    /// Run every fixture to a terminal status, notifying `sink` after each transition.
    ///
    /// The returned outcomes have the same length and order as `cases`.
    pub async fn run<P>(&self, cases: Vec<TestCase>, sink: &mut P) -> Vec<TestOutcome>
    where
        P: ProgressSink + ?Sized,
    {
        let mut outcomes: Vec<TestOutcome> = cases
            .iter()
            .map(|case| TestOutcome::pending(&case.file_name))
            .collect();
        sink.on_update(&outcomes);
        tracing::info!(fixtures = cases.len(), jobs = ?self.jobs, "starting run");

        let limiter = self.jobs.map(|n| Arc::new(Semaphore::new(n)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handles = Vec::with_capacity(cases.len());

        for (index, case) in cases.into_iter().enumerate() {
            let tx = tx.clone();
            let limiter = limiter.clone();
            let reference = Arc::clone(&self.reference);
            let subject = Arc::clone(&self.subject);
            let runtime = Arc::clone(&self.runtime);

            handles.push(tokio::spawn(async move {
                // Closed semaphores are never produced here; a failed acquire just runs unthrottled.
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let _ = tx.send(Update::Running(index));

                let (reference, subject) = tokio::join!(
                    run_pipeline(reference.as_ref(), runtime.as_ref(), &case.source_text),
                    run_pipeline(subject.as_ref(), runtime.as_ref(), &case.source_text),
                );
                let verdict = decide(&reference, &subject);
                if let Verdict::Failure(kind) = &verdict {
                    tracing::warn!(file = %case.file_name, %kind, "fixture failed");
                }
                let _ = tx.send(Update::Finished {
                    index,
                    verdict,
                    reference,
                    subject,
                });
            }));
        }
        drop(tx);

        while let Some(update) = rx.recv().await {
            let changed = match update {
                Update::Running(index) => outcomes[index].start(),
                Update::Finished {
                    index,
                    verdict,
                    reference,
                    subject,
                } => outcomes[index].complete(verdict, reference, subject),
            };
            if changed {
                sink.on_update(&outcomes);
            }
        }

        // Every sender is gone, so every task has finished; surface any that died before reporting.
        for (index, handle) in handles.into_iter().enumerate() {
            if let Err(err) = handle.await {
                tracing::error!(file = %outcomes[index].file_name, %err, "fixture task aborted");
                if outcomes[index].abort(err.to_string()) {
                    sink.on_update(&outcomes);
                }
            }
        }

        outcomes
    }
}

/// Compile, then execute only if the compilation came out clean.
async fn run_pipeline<C, X>(compiler: &C, runtime: &X, source: &str) -> PipelineResult
where
    C: Compiler,
    X: Runtime,
{
    let compilation = compiler.compile(source).await;
    let execution = if compilation.is_clean() {
        Some(runtime.run(&compilation.generated_code).await)
    } else {
        None
    };
    PipelineResult::new(compilation, execution)
}
