//! Hugging Face Inference API client implementing the core `Generator` trait.
//!
//! `POST {api}/models/{model}` with `{"inputs": prompt}` and a Bearer token. The
//! completion text is pulled out of whichever response shape the model returns; see
//! [`extract_generated_text`].

use std::fmt;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use site_forge_core::contract::{Generator, GeneratorError};

use crate::github::preview;

pub const DEFAULT_API_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "bigcode/starcoder2-3b";

#[derive(Clone)]
pub struct HuggingFaceConfig {
    pub api_base_url: String,
    pub model: String,
    pub token: String,
}

impl fmt::Debug for HuggingFaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HuggingFaceConfig")
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("token_len", &self.token.len())
            .finish()
    }
}

pub struct HuggingFaceClient {
    http: Client,
    config: HuggingFaceConfig,
}

impl HuggingFaceClient {
    pub fn new(config: HuggingFaceConfig) -> Self {
        tracing::info!(
            model = %config.model,
            token_set = !config.token.is_empty(),
            "Initialized HuggingFaceClient"
        );
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn model_url(&self) -> String {
        format!(
            "{}/models/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl Generator for HuggingFaceClient {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let url = self.model_url();
        tracing::info!(url = %url, prompt_len = prompt.len(), "[GENERATE] Requesting completion");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&json!({ "inputs": prompt }))
            .send()
            .await
            .map_err(|e| GeneratorError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GeneratorError::Transport(e.to_string()))?;
        tracing::debug!(status = status.as_u16(), preview = %preview(&body), "[GENERATE] Response received");

        match status {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(GeneratorError::ModelNotFound { url }),
            StatusCode::UNAUTHORIZED => return Err(GeneratorError::Unauthorized),
            other => {
                return Err(GeneratorError::Status {
                    status: other.as_u16(),
                    body,
                })
            }
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| GeneratorError::UnexpectedResponse(format!("invalid JSON: {e}")))?;
        extract_generated_text(&value)
            .ok_or_else(|| GeneratorError::UnexpectedResponse(preview(&body).to_string()))
    }
}

/// Pull the completion text out of an inference response.
///
/// Tried in order: `[{"generated_text": ..}]`, `{"generated_text": ..}`, then the first
/// string value of an object.
pub fn extract_generated_text(value: &Value) -> Option<String> {
    if let Some(text) = value
        .as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.get("generated_text"))
        .and_then(Value::as_str)
    {
        return Some(text.to_string());
    }
    let object = value.as_object()?;
    if let Some(text) = object.get("generated_text").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    object.values().find_map(|v| v.as_str().map(str::to_string))
}
