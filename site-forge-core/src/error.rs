//! Error taxonomy for a publishing run.
//!
//! [`PublishError`] covers the publisher's own recovery limits; [`PipelineError`] is what
//! the orchestrator hands to the CLI, which prints it and exits non-zero.

use std::path::PathBuf;

use thiserror::Error;

use crate::contract::{GeneratorError, HostError};

/// Outcome of writing the file set to one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchAttempt {
    pub branch: String,
    /// Files committed on this branch before the attempt stopped, in write order.
    pub written: Vec<String>,
    /// The file that failed and why; `None` when every file was written.
    pub failure: Option<(String, HostError)>,
}

impl BranchAttempt {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("nothing to publish: file set is empty")]
    EmptyFileSet,

    #[error("no free repository name derived from '{base}' after {attempts} attempts")]
    NamesExhausted { base: String, attempts: u32 },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("publishing failed on every branch: {}", describe_attempts(.attempts))]
    BranchesExhausted { attempts: Vec<BranchAttempt> },
}

fn describe_attempts(attempts: &[BranchAttempt]) -> String {
    attempts
        .iter()
        .map(|a| match &a.failure {
            Some((file, err)) => format!(
                "{} ({} written, '{}' failed: {})",
                a.branch,
                a.written.len(),
                file,
                err
            ),
            None => format!("{} (ok)", a.branch),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialise ledger: {0}")]
    Serialise(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("generation failed: {0}")]
    Generate(#[from] GeneratorError),

    #[error("generated artifact contains no 'FILE: ' sections")]
    EmptyArtifact,

    #[error("publishing failed: {0}")]
    Publish(#[from] PublishError),

    #[error("ledger update failed: {0}")]
    Ledger(#[from] LedgerError),
}
