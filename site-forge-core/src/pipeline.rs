//! High-level pipeline: generate → parse → create repository → publish → record.
//!
//! [`publish_site`] runs one publication end to end, strictly in sequence. Each stage
//! either hands its output to the next or returns a [`PipelineError`]; nothing is undone
//! on failure (a created but empty repository stays where it is).
//!
//! # Responsibilities
//! - Rejects an artifact without any `FILE: ` section before touching the hosting service
//! - Delegates name collisions and branch fallback to [`Publisher`]
//! - Records the final repository name and URL in the [`Ledger`]
//!
//! # Callable From
//! - The CLI crate (`site-forge publish`) and integration tests with mocked services.

use chrono::NaiveDate;
use tracing::{error, info};

use crate::artifact::{self, FileSet};
use crate::config::PipelineConfig;
use crate::contract::{Generator, Host};
use crate::error::PipelineError;
use crate::ledger::{Ledger, LedgerEntry};
use crate::publish::Publisher;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub repository: String,
    pub url: String,
    pub branch: String,
    pub files: Vec<String>,
    /// Files left on a branch whose attempt was abandoned, per branch.
    pub left_behind: Vec<(String, Vec<String>)>,
    /// Ledger size after the append.
    pub ledger_entries: usize,
}

pub async fn publish_site<G, H>(
    config: &PipelineConfig,
    generator: &G,
    host: &H,
    today: NaiveDate,
) -> Result<PublishReport, PipelineError>
where
    G: Generator,
    H: Host,
{
    info!("[PIPELINE] Starting site publication");

    // Step 1: Generate
    let raw = generator.generate(&config.prompt).await.map_err(|e| {
        error!(error = %e, "[PIPELINE][ERROR] Generation failed");
        PipelineError::Generate(e)
    })?;
    info!(bytes = raw.len(), "[PIPELINE] Artifact received");

    // Step 2: Parse
    let files: FileSet = artifact::parse(&raw);
    if files.is_empty() {
        error!("[PIPELINE][ERROR] Artifact has no FILE sections, nothing to publish");
        return Err(PipelineError::EmptyArtifact);
    }
    info!(files = ?files.names().collect::<Vec<_>>(), "[PIPELINE] Artifact parsed");

    // Step 3: Create the repository
    let publisher = Publisher::new(
        host,
        config.namer.clone(),
        config.retry.clone(),
        config.branches.clone(),
    )
    .private(config.private);
    let base = config.namer.base_name(today);
    let repo = publisher.create_repository(&base).await?;

    // Step 4: Publish
    let outcome = publisher.publish_files(&repo, &files).await?;

    // Step 5: Record
    let entry = LedgerEntry {
        name: repo.name.clone(),
        url: repo.html_url.clone(),
        date: today,
    };
    let ledger_entries = Ledger::new(&config.ledger_path).append(&entry)?;

    info!(repo = %repo.name, url = %repo.html_url, branch = %outcome.branch, "[PIPELINE] Site published");

    Ok(PublishReport {
        repository: repo.name,
        url: repo.html_url,
        branch: outcome.branch,
        files: outcome.written,
        left_behind: outcome
            .abandoned
            .into_iter()
            .map(|a| (a.branch, a.written))
            .collect(),
        ledger_entries,
    })
}
