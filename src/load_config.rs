use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{error, info};

use site_forge_core::config::{
    BranchConfig, PipelineConfig, RetryConfig, DEFAULT_LEDGER_PATH, DEFAULT_PROMPT,
};
use site_forge_core::naming::RepositoryNamer;

use crate::generator::{self, HuggingFaceConfig};
use crate::github::{self, GitHubConfig};

pub const GENERATOR_TOKEN_VAR: &str = "HF_TOKEN";
pub const GENERATOR_MODEL_VAR: &str = "HF_MODEL";
pub const HOSTING_TOKEN_VAR: &str = "GH_TOKEN";

/// Fully merged configuration for a `publish` run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub generator: HuggingFaceConfig,
    pub hosting: GitHubConfig,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct StaticConfig {
    prompt: Option<String>,
    ledger_path: Option<PathBuf>,
    generator: GeneratorSection,
    hosting: HostingSection,
    naming: NamingSection,
    publish: PublishSection,
    retry: RetrySection,
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GeneratorSection {
    model: String,
    api_base_url: String,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            model: generator::DEFAULT_MODEL.to_string(),
            api_base_url: generator::DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct HostingSection {
    api_base_url: String,
    web_base_url: String,
    private: bool,
}

impl Default for HostingSection {
    fn default() -> Self {
        Self {
            api_base_url: github::DEFAULT_API_BASE_URL.to_string(),
            web_base_url: github::DEFAULT_WEB_BASE_URL.to_string(),
            private: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct NamingSection {
    prefix: String,
    suffix_len: usize,
}

impl Default for NamingSection {
    fn default() -> Self {
        Self {
            prefix: "site".to_string(),
            suffix_len: 6,
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PublishSection {
    primary_branch: String,
    fallback_branch: String,
}

impl Default for PublishSection {
    fn default() -> Self {
        let branches = BranchConfig::default();
        Self {
            primary_branch: branches.primary,
            fallback_branch: branches.fallback,
        }
    }
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RetrySection {
    max_attempts: u32,
    initial_delay_ms: u64,
    max_delay_ms: u64,
    multiplier: f64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 8000,
            multiplier: 2.0,
        }
    }
}

/// Read the optional YAML file without touching the environment.
///
/// Used on its own by commands that need no credentials (e.g. listing the ledger).
pub fn load_pipeline_config(path: Option<&Path>) -> Result<PipelineConfig> {
    Ok(build_pipeline(read_static(path)?))
}

/// Load the optional YAML file and inject the required secrets from the environment.
///
/// Fails before any client is built when `HF_TOKEN` or `GH_TOKEN` is missing.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let generator_token = required_env(GENERATOR_TOKEN_VAR)?;
    let hosting_token = required_env(HOSTING_TOKEN_VAR)?;

    let static_conf = read_static(path)?;

    let model = match std::env::var(GENERATOR_MODEL_VAR) {
        Ok(model) if !model.trim().is_empty() => {
            info!(model = %model, "HF_MODEL overrides configured model");
            model
        }
        _ => static_conf.generator.model.clone(),
    };

    let generator = HuggingFaceConfig {
        api_base_url: static_conf.generator.api_base_url.clone(),
        model,
        token: generator_token,
    };
    let hosting = GitHubConfig {
        api_base_url: static_conf.hosting.api_base_url.clone(),
        web_base_url: static_conf.hosting.web_base_url.clone(),
        token: hosting_token,
    };
    let pipeline = build_pipeline(static_conf);

    info!(
        model = %generator.model,
        hosting = %hosting.api_base_url,
        "Config loaded and merged successfully"
    );
    pipeline.trace_loaded();

    Ok(AppConfig {
        pipeline,
        generator,
        hosting,
    })
}

fn required_env(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => {
            info!(var, len = value.len(), "Credential found in env");
            Ok(value)
        }
        Ok(_) => {
            error!(var, "Credential environment variable is empty");
            anyhow::bail!("{var} environment variable is empty")
        }
        Err(e) => {
            error!(error = ?e, var, "Credential environment variable not set");
            anyhow::bail!("{var} environment variable not set")
        }
    }
}

fn read_static(path: Option<&Path>) -> Result<StaticConfig> {
    let Some(path) = path else {
        info!("No config file given, using defaults");
        return Ok(StaticConfig::default());
    };
    info!(config_path = ?path, "Loading configuration from file");

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    match serde_yaml::from_str::<Option<StaticConfig>>(&content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf.unwrap_or_default())
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

fn build_pipeline(conf: StaticConfig) -> PipelineConfig {
    PipelineConfig {
        prompt: conf.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
        namer: RepositoryNamer::new(conf.naming.prefix, conf.naming.suffix_len),
        private: conf.hosting.private,
        branches: BranchConfig {
            primary: conf.publish.primary_branch,
            fallback: conf.publish.fallback_branch,
        },
        retry: RetryConfig {
            max_attempts: conf.retry.max_attempts.max(1),
            initial_delay: Duration::from_millis(conf.retry.initial_delay_ms),
            max_delay: Duration::from_millis(conf.retry.max_delay_ms),
            multiplier: conf.retry.multiplier,
        },
        ledger_path: conf
            .ledger_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH)),
    }
}
