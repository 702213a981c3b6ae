use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::naming::RepositoryNamer;

/// Prompt sent to the generator when none is configured.
pub const DEFAULT_PROMPT: &str = "\
Come up with a unique, human-useful website idea (game, tool, visualizer, or productivity app). \
Then give the full working code for the website as the files index.html, style.css and script.js.
Start every file with a line of the form `FILE: <name>` followed by the file content, \
and write nothing else outside those sections.
";

pub const DEFAULT_LEDGER_PATH: &str = "dashboard/sites.json";

/// Everything one publishing run needs, apart from the service clients.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub prompt: String,
    pub namer: RepositoryNamer,
    pub private: bool,
    pub branches: BranchConfig,
    pub retry: RetryConfig,
    pub ledger_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            namer: RepositoryNamer::default(),
            private: false,
            branches: BranchConfig::default(),
            retry: RetryConfig::default(),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
        }
    }
}

impl PipelineConfig {
    pub fn trace_loaded(&self) {
        info!(
            primary_branch = %self.branches.primary,
            fallback_branch = %self.branches.fallback,
            max_attempts = self.retry.max_attempts,
            ledger_path = %self.ledger_path.display(),
            "Loaded PipelineConfig"
        );
        debug!(?self, "PipelineConfig loaded (full debug)");
    }
}

/// Branch written first, and the one retried when it fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchConfig {
    pub primary: String,
    pub fallback: String,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            primary: "main".to_string(),
            fallback: "master".to_string(),
        }
    }
}

/// Bounded exponential backoff for repository-name collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total creation attempts, the first (base name) included.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay after the `attempt`-th collision (1-based), capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }
}
