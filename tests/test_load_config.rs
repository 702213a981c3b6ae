use std::env;
use std::fs::write;
use std::path::PathBuf;
use std::time::Duration;

use serial_test::serial;
use tempfile::NamedTempFile;

use site_forge::load_config::{load_config, load_pipeline_config};

fn set_tokens() {
    env::set_var("HF_TOKEN", "hf_test_token");
    env::set_var("GH_TOKEN", "gh_test_token");
    env::remove_var("HF_MODEL");
}

/// A static config plus required env vars produces a fully merged AppConfig.
#[test]
#[serial]
fn test_load_config_success_injects_env_secrets() {
    let config_yaml = r#"
prompt: "FILE: only this"
ledger_path: ./tmp/ledger.json
generator:
  model: some/model
naming:
  prefix: demo
publish:
  primary_branch: trunk
  fallback_branch: main
retry:
  max_attempts: 3
  initial_delay_ms: 10
  max_delay_ms: 40
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();
    set_tokens();

    let config = load_config(Some(config_file.path())).expect("Config should load");

    assert_eq!(config.generator.token, "hf_test_token");
    assert_eq!(config.generator.model, "some/model");
    assert_eq!(config.hosting.token, "gh_test_token");
    assert_eq!(config.hosting.api_base_url, "https://api.github.com");
    assert_eq!(config.pipeline.prompt, "FILE: only this");
    assert_eq!(config.pipeline.ledger_path, PathBuf::from("./tmp/ledger.json"));
    assert_eq!(config.pipeline.branches.primary, "trunk");
    assert_eq!(config.pipeline.branches.fallback, "main");
    assert_eq!(config.pipeline.retry.max_attempts, 3);
    assert_eq!(config.pipeline.retry.initial_delay, Duration::from_millis(10));
    assert_eq!(config.pipeline.retry.max_delay, Duration::from_millis(40));
    let day = chrono::NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    assert_eq!(config.pipeline.namer.base_name(day), "demo-20261016");
}

#[test]
#[serial]
fn test_load_config_defaults_without_file() {
    set_tokens();

    let config = load_config(None).expect("Config should load");

    assert_eq!(config.generator.model, "bigcode/starcoder2-3b");
    assert_eq!(config.pipeline.branches.primary, "main");
    assert_eq!(config.pipeline.branches.fallback, "master");
    assert_eq!(config.pipeline.ledger_path, PathBuf::from("dashboard/sites.json"));
    assert_eq!(config.pipeline.retry.max_attempts, 5);
    assert!(config.pipeline.prompt.contains("FILE: <name>"));
}

#[test]
#[serial]
fn test_load_config_model_env_overrides_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "generator:\n  model: from/file\n").unwrap();
    set_tokens();
    env::set_var("HF_MODEL", "from/env");

    let config = load_config(Some(config_file.path())).expect("Config should load");
    env::remove_var("HF_MODEL");

    assert_eq!(config.generator.model, "from/env");
}

#[test]
#[serial]
fn test_load_config_errors_on_missing_env() {
    env::remove_var("HF_TOKEN");
    env::set_var("GH_TOKEN", "gh_test_token");

    let err = load_config(None).unwrap_err();
    assert!(err.to_string().contains("HF_TOKEN"), "got: {err}");

    env::set_var("HF_TOKEN", "hf_test_token");
    env::remove_var("GH_TOKEN");

    let err = load_config(None).unwrap_err();
    assert!(err.to_string().contains("GH_TOKEN"), "got: {err}");
}

#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();
    set_tokens();

    let err = load_config(Some(config_file.path())).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_rejects_unknown_keys() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "publish:\n  branch: main\n").unwrap();
    set_tokens();

    assert!(load_config(Some(config_file.path())).is_err());
}

#[test]
#[serial]
fn test_load_pipeline_config_needs_no_secrets() {
    env::remove_var("HF_TOKEN");
    env::remove_var("GH_TOKEN");
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "ledger_path: other/ledger.json\n").unwrap();

    let config = load_pipeline_config(Some(config_file.path())).expect("Config should load");
    assert_eq!(config.ledger_path, PathBuf::from("other/ledger.json"));
}
