//! # site-forge CLI Interface (Module)
//!
//! Command parsing and the async [`run`] entrypoint shared by `main` and the
//! integration tests. Business logic lives in `site-forge-core`; this module only wires
//! configuration, the real service clients and user-visible output together.
//!
//! ## Commands
//! - `publish`: generate a site, publish it to a new repository, record it in the ledger
//! - `parse`: split a saved artifact into files offline (no credentials needed)
//! - `ledger`: list the recorded publications

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use site_forge_core::artifact;
use site_forge_core::ledger::Ledger;
use site_forge_core::pipeline::publish_site;

use crate::generator::HuggingFaceClient;
use crate::github::GitHubClient;
use crate::load_config::{load_config, load_pipeline_config};

/// CLI for site-forge: generate a website and publish it as a GitHub repository.
#[derive(Parser)]
#[clap(
    name = "site-forge",
    version,
    about = "Generate a small website, publish it to a fresh repository and record it in a ledger"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate, publish and record one site
    Publish {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Split a saved artifact into its FILE sections and list them
    Parse {
        /// Raw artifact text file
        #[clap(long)]
        input: PathBuf,
    },
    /// List the publications recorded in the ledger
    Ledger {
        /// Path to an optional YAML config file (for `ledger_path`)
        #[clap(long)]
        config: Option<PathBuf>,
        /// Ledger file; overrides the config
        #[clap(long)]
        path: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Publish { config } => {
            let config = load_config(config.as_deref())?;
            let generator = HuggingFaceClient::new(config.generator.clone());
            let host = GitHubClient::new(config.hosting.clone());

            println!("Site publication starting...");
            let today = Utc::now().date_naive();
            let report = publish_site(&config.pipeline, &generator, &host, today).await?;

            println!("Successfully created site repo: {}", report.url);
            println!("  repository: {}", report.repository);
            println!("  branch:     {}", report.branch);
            println!("  files:      {}", report.files.join(", "));
            for (branch, files) in &report.left_behind {
                println!("  abandoned:  {branch} ({} files left behind)", files.len());
            }
            println!(
                "  ledger:     {} ({} records)",
                config.pipeline.ledger_path.display(),
                report.ledger_entries
            );
            Ok(())
        }
        Commands::Parse { input } => {
            let raw = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read artifact {}", input.display()))?;
            let files = artifact::parse(&raw);
            if files.is_empty() {
                anyhow::bail!("No 'FILE: ' sections found in {}", input.display());
            }
            for (name, content) in &files {
                println!("{name}\t{} bytes", content.len());
            }
            Ok(())
        }
        Commands::Ledger { config, path } => {
            let path = match path {
                Some(path) => path,
                None => load_pipeline_config(config.as_deref())?.ledger_path,
            };
            let entries = Ledger::new(&path).entries();
            if entries.is_empty() {
                println!("No publications recorded in {}", path.display());
            }
            for entry in entries {
                println!("{}\t{}\t{}", entry.date, entry.name, entry.url);
            }
            Ok(())
        }
    }
}
