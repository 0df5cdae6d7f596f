//! Fatal harness errors.
//!
//! Anything that goes wrong inside a single fixture's pipelines is captured as data
//! (see [`crosscheck_core::ProcessError`]) and folded into that fixture's outcome. The errors here
//! are the ones that abort the whole run: an unreadable corpus, invalid configuration, or a report
//! that cannot be written.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("cannot list corpus directory '{}': {source}", .path.display())]
    ListCorpus {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read fixture '{}': {source}", .path.display())]
    ReadFixture {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot write report '{}': {source}", .path.display())]
    WriteReport {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type HarnessResult<T> = Result<T, HarnessError>;
