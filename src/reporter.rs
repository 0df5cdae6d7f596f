//! Progress and summary reporting.
//!
//! ## ProgressSink Trait
//!
//! The orchestrator pushes the full, ordered outcome list to a [`ProgressSink`] after every status
//! transition. Rendering is kept out of the orchestrator so runs can be driven without a terminal
//! (tests use recording sinks; CI can disable redraw).
//!
//! [`ConsoleReporter`] is the default sink: a live `file`/`status` table, then a final tally with one
//! detail block per failure.

use std::io::{self, Write};

use crosscheck_core::{PipelineResult, TestOutcome, TestStatus};

use crate::cli::ExitCode;

/// Clear screen and move the cursor home.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const RULE_WIDTH: usize = 72;

/// Receives the ordered outcome list after every transition.
pub trait ProgressSink {
    fn on_update(&mut self, outcomes: &[TestOutcome]);
}

/// Success/failure counts for a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
}

impl Tally {
    pub fn from_outcomes(outcomes: &[TestOutcome]) -> Self {
        let count = |status: TestStatus| outcomes.iter().filter(|o| o.status == status).count();
        Self {
            total: outcomes.len(),
            successes: count(TestStatus::Success),
            failures: count(TestStatus::Failure),
        }
    }

    /// `0` when nothing failed, `1` otherwise. The count itself is never encoded.
    pub fn exit_code(&self) -> ExitCode {
        if self.failures == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

/// Terminal reporter.
pub struct ConsoleReporter<W> {
    out: W,
    redraw: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(redraw: bool) -> Self {
        Self::new(io::stdout(), redraw)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, redraw: bool) -> Self {
        Self { out, redraw }
    }

    /// Print the tally and failure details; return the process exit code.
    pub fn finalize(&mut self, outcomes: &[TestOutcome]) -> io::Result<ExitCode> {
        let tally = Tally::from_outcomes(outcomes);
        self.out.write_all(render_summary(outcomes).as_bytes())?;
        self.out.flush()?;
        Ok(tally.exit_code())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressSink for ConsoleReporter<W> {
    fn on_update(&mut self, outcomes: &[TestOutcome]) {
        let mut frame = String::new();
        if self.redraw {
            frame.push_str(CLEAR_SCREEN);
        }
        frame.push_str(&render_table(outcomes));

        let written = self.out.write_all(frame.as_bytes()).and_then(|()| self.out.flush());
        if let Err(err) = written {
            tracing::debug!(%err, "failed to render progress table");
        }
    }
}

/// Header plus an index/file/status table in discovery order.
pub fn render_table(outcomes: &[TestOutcome]) -> String {
    let file_width = outcomes
        .iter()
        .map(|o| o.file_name.chars().count())
        .chain(["file".len()])
        .max()
        .unwrap_or(0);
    let index_width = outcomes.len().saturating_sub(1).to_string().len();

    let mut table = String::from("Running integration tests...\n");
    table.push_str(&format!("{:>index_width$}  {:<file_width$}  status\n", "#", "file"));
    for (index, outcome) in outcomes.iter().enumerate() {
        table.push_str(&format!(
            "{:>index_width$}  {:<file_width$}  {}\n",
            index, outcome.file_name, outcome.status
        ));
    }
    table
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Final tally, failure details and closing line.
pub fn render_summary(outcomes: &[TestOutcome]) -> String {
    let tally = Tally::from_outcomes(outcomes);
    let mut text = format!(
        "Ran {} tests: {}, {}\n",
        tally.total,
        plural(tally.successes, "success", "successes"),
        plural(tally.failures, "failure", "failures"),
    );

    if tally.failures > 0 {
        let rule = "-".repeat(RULE_WIDTH);
        text.push_str("\nSummary of errors:\n");
        text.push_str(&rule);
        text.push('\n');
        for outcome in outcomes.iter().filter(|o| o.status == TestStatus::Failure) {
            text.push_str(&render_failure(outcome));
            text.push_str(&rule);
            text.push('\n');
        }
    }

    let with = if tally.failures > 0 { "with" } else { "without" };
    text.push_str(&format!("Integration tests complete {with} errors\n"));
    text
}

fn render_failure(outcome: &TestOutcome) -> String {
    let mut block = format!("  In {}...\n", outcome.file_name);
    if let Some(kind) = &outcome.failure {
        block.push_str(&format!("    Reason: {kind}\n"));
    }
    for (label, pipeline) in [("Reference", &outcome.reference), ("Subject", &outcome.subject)] {
        match pipeline {
            Some(result) => block.push_str(&render_pipeline(label, result)),
            None => block.push_str(&format!("    {label}: no result recorded\n")),
        }
    }
    block
}

fn render_pipeline(label: &str, result: &PipelineResult) -> String {
    format!(
        "    {label} generated code: {}\n    {label} output: {}\n",
        result.compilation.generated_code,
        result.observed_output()
    )
}
