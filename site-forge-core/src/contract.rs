//! # contract: ports to the generator and hosting services
//!
//! This module defines the two traits the pipeline talks through, and the plain data
//! types that cross them:
//!
//! - [`Generator`]: turns a free-text prompt into a raw artifact (one text blob).
//! - [`Host`]: allocates repositories and writes files into them on a named branch.
//!
//! Implementations live outside this crate (HTTP clients in the `site-forge` binary crate)
//! or are generated by `mockall` for tests.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall` so consumers get `MockGenerator` / `MockHost`
//!   under `cfg(test)` or the `test-export-mocks` feature.
//!
//! ## Errors
//! - [`HostError::RepositoryExists`] is the one distinguished failure: callers treat it as
//!   a name collision and retry under a new name. Every other variant is fatal for the
//!   calling operation.

use async_trait::async_trait;
use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// A repository the hosting service has allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRepository {
    /// Account or organisation that owns the repository.
    pub owner: String,
    /// Final repository name (after any collision renames).
    pub name: String,
    /// Browser URL of the repository, recorded in the ledger.
    pub html_url: String,
}

/// One create-or-update file operation against a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    /// Path of the file inside the repository.
    pub path: String,
    /// Full UTF-8 content; the implementor handles transport encoding.
    pub content: String,
    /// Target branch.
    pub branch: String,
    /// Commit message.
    pub message: String,
}

/// Failures reported by a [`Host`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The requested repository name is already taken.
    #[error("repository '{name}' already exists")]
    RepositoryExists { name: String },

    /// The service answered with a non-success status.
    #[error("hosting service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The file path cannot be expressed as a repository path (empty, `.` or `..` segments).
    #[error("invalid file path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The request never produced a response.
    #[error("hosting transport error: {0}")]
    Transport(String),

    /// The response could not be decoded.
    #[error("failed to decode hosting response: {0}")]
    Decode(String),
}

/// Failures reported by a [`Generator`] implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("generator rejected the credential (401)")]
    Unauthorized,

    #[error("model not found at {url} (404)")]
    ModelNotFound { url: String },

    #[error("generator returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generator transport error: {0}")]
    Transport(String),

    #[error("unexpected generator response: {0}")]
    UnexpectedResponse(String),
}

/// Source of raw artifacts.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Send `prompt` and return the completion text verbatim.
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Hosted-repository service.
///
/// The trait is implemented by real clients and by test mocks. It carries no retry
/// policy of its own; collision renames and branch fallback live in
/// [`crate::publish::Publisher`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Host: Send + Sync {
    /// Allocate a new repository called `name`.
    ///
    /// Must return [`HostError::RepositoryExists`] when the name is taken.
    async fn create_repository(
        &self,
        name: &str,
        private: bool,
    ) -> Result<CreatedRepository, HostError>;

    /// Create or update a single file on the branch named in `write`.
    async fn put_file(&self, repo: &CreatedRepository, write: &FileWrite)
        -> Result<(), HostError>;
}
