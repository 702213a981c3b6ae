#![doc = "GitHub REST client implementing the core `Host` trait."]
//
//! # GitHub Host
//!
//! Bridges [`site_forge_core::contract::Host`] to the GitHub REST API:
//!
//! - `create_repository` → `POST /user/repos` (repository under the token's user account)
//! - `put_file` → `PUT /repos/{owner}/{repo}/contents/{path}` (create-or-update, base64 body)
//!
//! A `422` answer to repository creation whose body says the name already exists is
//! reported as [`HostError::RepositoryExists`]; the publisher turns that into a rename.
//! All other non-2xx answers become [`HostError::Status`] with the response body.
//!
//! Construct with [`GitHubClient::new`] from a [`GitHubConfig`] built by
//! [`crate::load_config`].

use std::fmt;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;

use site_forge_core::contract::{CreatedRepository, FileWrite, Host, HostError};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_WEB_BASE_URL: &str = "https://github.com";

const USER_AGENT: &str = concat!("site-forge/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(Clone)]
pub struct GitHubConfig {
    pub api_base_url: String,
    pub web_base_url: String,
    pub token: String,
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_base_url", &self.api_base_url)
            .field("web_base_url", &self.web_base_url)
            .field("token_len", &self.token.len())
            .finish()
    }
}

pub struct GitHubClient {
    http: Client,
    config: GitHubConfig,
}

#[derive(Deserialize)]
struct RepoResponse {
    name: String,
    owner: OwnerResponse,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct OwnerResponse {
    login: String,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Self {
        tracing::info!(
            api_base_url = %config.api_base_url,
            token_set = !config.token.is_empty(),
            "Initialized GitHubClient"
        );
        Self {
            http: Client::new(),
            config,
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("token {}", self.config.token))
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
    }
}

#[async_trait]
impl Host for GitHubClient {
    async fn create_repository(
        &self,
        name: &str,
        private: bool,
    ) -> Result<CreatedRepository, HostError> {
        let url = self.api("/user/repos");
        tracing::debug!(url = %url, repo = name, "[GITHUB] Creating repository");

        let resp = self
            .authorized(self.http.post(&url))
            .json(&json!({ "name": name, "auto_init": false, "private": private }))
            .send()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;
        tracing::debug!(status = status.as_u16(), preview = %preview(&body), "[GITHUB] create repository response");

        if status.is_success() {
            return repository_from_body(&body, &self.config.web_base_url);
        }
        if is_name_collision(status, &body) {
            return Err(HostError::RepositoryExists {
                name: name.to_string(),
            });
        }
        Err(HostError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn put_file(
        &self,
        repo: &CreatedRepository,
        write: &FileWrite,
    ) -> Result<(), HostError> {
        let url = contents_url(&self.config.api_base_url, &repo.owner, &repo.name, &write.path)?;
        tracing::debug!(url = %url, branch = %write.branch, "[GITHUB] Writing file");

        let resp = self
            .authorized(self.http.put(url))
            .json(&json!({
                "message": write.message,
                "content": STANDARD.encode(write.content.as_bytes()),
                "branch": write.branch,
            }))
            .send()
            .await
            .map_err(|e| HostError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            tracing::debug!(status = status.as_u16(), file = %write.path, "[GITHUB] File written");
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), preview = %preview(&body), "[GITHUB] put file response");
        Err(HostError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// GitHub reports a taken name as 422 with an "already exists" validation message.
fn is_name_collision(status: StatusCode, body: &str) -> bool {
    status == StatusCode::UNPROCESSABLE_ENTITY && body.contains("already exists")
}

/// `{api}/repos/{owner}/{repo}/contents/{path}` with every segment percent-encoded.
///
/// File names come from the generator unvalidated, so `#`, `?`, `%` and spaces must not
/// leak into the URL structure. Dot segments cannot be encoded away and are refused.
fn contents_url(api_base_url: &str, owner: &str, repo: &str, path: &str) -> Result<Url, HostError> {
    let invalid = |reason: &str| HostError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(invalid("empty path"));
    }
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(invalid("'.' and '..' segments are not allowed"));
    }

    let mut url = Url::parse(api_base_url)
        .map_err(|e| HostError::Transport(format!("invalid API base URL: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| HostError::Transport(format!("API base URL cannot be a base: {api_base_url}")))?
        .pop_if_empty()
        .extend(["repos", owner, repo, "contents"])
        .extend(segments);
    Ok(url)
}

fn repository_from_body(body: &str, web_base_url: &str) -> Result<CreatedRepository, HostError> {
    let parsed: RepoResponse =
        serde_json::from_str(body).map_err(|e| HostError::Decode(e.to_string()))?;
    let html_url = parsed.html_url.unwrap_or_else(|| {
        format!(
            "{}/{}/{}",
            web_base_url.trim_end_matches('/'),
            parsed.owner.login,
            parsed.name
        )
    });
    Ok(CreatedRepository {
        owner: parsed.owner.login,
        name: parsed.name,
        html_url,
    })
}

/// First 200 characters of a response body, for debug logs.
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
