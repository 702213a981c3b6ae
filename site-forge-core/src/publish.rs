//! Repository creation and file publishing.
//!
//! # Repository creation
//! [`Publisher::create_repository`] first asks for the date-derived base name. A
//! [`HostError::RepositoryExists`] answer is expected (a second run on the same day) and is
//! recovered by asking again under [`RepositoryNamer::unique_name`], with exponential
//! backoff between attempts and a hard attempt limit. Any other host error ends creation
//! and is returned unchanged.
//!
//! # Publishing
//! [`Publisher::publish_files`] writes every file as an independent create-or-update call.
//! The write set is not transactional: when file K fails, files 1..K-1 stay committed.
//! The remaining files are abandoned and the whole set is written again on the fallback
//! branch, once. Hosting accounts name their default branch differently and the
//! branch is not looked up beforehand, hence the fallback.
//!
//! Every attempt is recorded as a [`BranchAttempt`] so the files left behind by a failed
//! attempt can be found later.

use tracing::{debug, error, info, warn};

use crate::artifact::FileSet;
use crate::config::{BranchConfig, RetryConfig};
use crate::contract::{CreatedRepository, FileWrite, Host, HostError};
use crate::error::{BranchAttempt, PublishError};
use crate::naming::RepositoryNamer;

/// Result of a successful [`Publisher::publish_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Branch that received the complete file set.
    pub branch: String,
    /// Files written on `branch`, in write order.
    pub written: Vec<String>,
    /// Earlier failed attempts, possibly with partially written files.
    pub abandoned: Vec<BranchAttempt>,
}

pub struct Publisher<'a, H: Host> {
    host: &'a H,
    namer: RepositoryNamer,
    retry: RetryConfig,
    branches: BranchConfig,
    private: bool,
}

impl<'a, H: Host> Publisher<'a, H> {
    pub fn new(
        host: &'a H,
        namer: RepositoryNamer,
        retry: RetryConfig,
        branches: BranchConfig,
    ) -> Self {
        Self {
            host,
            namer,
            retry,
            branches,
            private: false,
        }
    }

    pub fn private(mut self, private: bool) -> Self {
        self.private = private;
        self
    }

    /// Create a repository named `base`, or a suffixed variant of it after collisions.
    pub async fn create_repository(&self, base: &str) -> Result<CreatedRepository, PublishError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut name = base.to_string();

        for attempt in 1..=max_attempts {
            info!(repo = %name, attempt, "[PUBLISH] Creating repository");
            match self.host.create_repository(&name, self.private).await {
                Ok(repo) => {
                    info!(repo = %repo.name, owner = %repo.owner, url = %repo.html_url, "[PUBLISH] Repository created");
                    return Ok(repo);
                }
                Err(HostError::RepositoryExists { .. }) if attempt < max_attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    let next = self.namer.unique_name(base);
                    warn!(
                        repo = %name,
                        next = %next,
                        delay_ms = delay.as_millis() as u64,
                        "[PUBLISH] Repository name taken, retrying under a new name"
                    );
                    tokio::time::sleep(delay).await;
                    name = next;
                }
                Err(HostError::RepositoryExists { .. }) => break,
                Err(e) => {
                    error!(repo = %name, error = %e, "[PUBLISH][ERROR] Repository creation failed");
                    return Err(PublishError::Host(e));
                }
            }
        }

        error!(base = %base, attempts = max_attempts, "[PUBLISH][ERROR] Ran out of repository names");
        Err(PublishError::NamesExhausted {
            base: base.to_string(),
            attempts: max_attempts,
        })
    }

    /// Write `files` to the primary branch, falling back to the secondary branch once.
    pub async fn publish_files(
        &self,
        repo: &CreatedRepository,
        files: &FileSet,
    ) -> Result<PublishOutcome, PublishError> {
        if files.is_empty() {
            return Err(PublishError::EmptyFileSet);
        }

        let mut branches = vec![self.branches.primary.as_str()];
        if self.branches.fallback != self.branches.primary {
            branches.push(self.branches.fallback.as_str());
        }

        let mut attempts = Vec::with_capacity(branches.len());
        for branch in branches {
            let attempt = self.write_all(repo, files, branch).await;
            if attempt.succeeded() {
                info!(
                    repo = %repo.name,
                    branch,
                    files = attempt.written.len(),
                    "[PUBLISH] All files written"
                );
                return Ok(PublishOutcome {
                    branch: attempt.branch,
                    written: attempt.written,
                    abandoned: attempts,
                });
            }
            warn!(
                repo = %repo.name,
                branch,
                left_behind = ?attempt.written,
                "[PUBLISH] Branch attempt abandoned"
            );
            attempts.push(attempt);
        }

        error!(repo = %repo.name, "[PUBLISH][ERROR] Every branch attempt failed");
        Err(PublishError::BranchesExhausted { attempts })
    }

    async fn write_all(&self, repo: &CreatedRepository, files: &FileSet, branch: &str) -> BranchAttempt {
        let mut written = Vec::with_capacity(files.len());
        for (path, content) in files {
            let write = FileWrite {
                path: path.clone(),
                content: content.clone(),
                branch: branch.to_string(),
                message: format!("Add {path}"),
            };
            debug!(repo = %repo.name, branch, file = %path, bytes = content.len(), "[PUBLISH] Writing file");
            if let Err(e) = self.host.put_file(repo, &write).await {
                error!(repo = %repo.name, branch, file = %path, error = %e, "[PUBLISH][ERROR] File write failed");
                return BranchAttempt {
                    branch: branch.to_string(),
                    written,
                    failure: Some((path.clone(), e)),
                };
            }
            written.push(path.clone());
        }
        BranchAttempt {
            branch: branch.to_string(),
            written,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MockHost;

    fn repo() -> CreatedRepository {
        CreatedRepository {
            owner: "octo".into(),
            name: "site-20261016".into(),
            html_url: "https://github.com/octo/site-20261016".into(),
        }
    }

    fn created(name: &str) -> CreatedRepository {
        CreatedRepository {
            owner: "octo".into(),
            name: name.to_string(),
            html_url: format!("https://github.com/octo/{name}"),
        }
    }

    fn three_files() -> FileSet {
        let mut files = FileSet::new();
        files.insert("a", "1\n");
        files.insert("b", "2\n");
        files.insert("c", "3\n");
        files
    }

    fn publisher(host: &MockHost, max_attempts: u32) -> Publisher<'_, MockHost> {
        Publisher::new(
            host,
            RepositoryNamer::default(),
            RetryConfig::immediate(max_attempts),
            BranchConfig::default(),
        )
    }

    #[tokio::test]
    async fn create_uses_base_name_when_free() {
        let mut host = MockHost::new();
        host.expect_create_repository()
            .withf(|name, private| name == "site-20261016" && !*private)
            .times(1)
            .returning(|name, _| Ok(created(name)));

        let repo = publisher(&host, 3)
            .create_repository("site-20261016")
            .await
            .unwrap();
        assert_eq!(repo.name, "site-20261016");
    }

    #[tokio::test]
    async fn create_renames_after_collision() {
        let mut host = MockHost::new();
        host.expect_create_repository()
            .withf(|name, _| name == "site-20261016")
            .times(1)
            .returning(|name, _| {
                Err(HostError::RepositoryExists {
                    name: name.to_string(),
                })
            });
        host.expect_create_repository()
            .withf(|name, _| name.starts_with("site-20261016-"))
            .times(1)
            .returning(|name, _| Ok(created(name)));

        let repo = publisher(&host, 3)
            .create_repository("site-20261016")
            .await
            .unwrap();
        assert_ne!(repo.name, "site-20261016");
        assert!(repo.name.starts_with("site-20261016-"));
    }

    #[tokio::test]
    async fn create_stops_after_max_attempts() {
        let mut host = MockHost::new();
        host.expect_create_repository()
            .times(4)
            .returning(|name, _| {
                Err(HostError::RepositoryExists {
                    name: name.to_string(),
                })
            });

        let err = publisher(&host, 4)
            .create_repository("site-20261016")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PublishError::NamesExhausted { attempts: 4, .. }
        ));
    }

    #[tokio::test]
    async fn create_propagates_other_failures_unchanged() {
        let mut host = MockHost::new();
        host.expect_create_repository().times(1).returning(|_, _| {
            Err(HostError::Status {
                status: 401,
                body: "Bad credentials".into(),
            })
        });

        let err = publisher(&host, 5)
            .create_repository("site-20261016")
            .await
            .unwrap_err();
        match err {
            PublishError::Host(HostError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "Bad credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_propagates_failure_after_rename_unchanged() {
        let mut host = MockHost::new();
        host.expect_create_repository()
            .withf(|name, _| name == "site-20261016")
            .times(1)
            .returning(|name, _| {
                Err(HostError::RepositoryExists {
                    name: name.to_string(),
                })
            });
        host.expect_create_repository()
            .withf(|name, _| name.starts_with("site-20261016-"))
            .times(1)
            .returning(|_, _| {
                Err(HostError::Status {
                    status: 401,
                    body: "Bad credentials".into(),
                })
            });

        let err = publisher(&host, 5)
            .create_repository("site-20261016")
            .await
            .unwrap_err();
        match err {
            PublishError::Host(HostError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "Bad credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_writes_in_order_on_primary() {
        let mut host = MockHost::new();
        let mut seq = mockall::Sequence::new();
        for (path, content) in [("a", "1\n"), ("b", "2\n"), ("c", "3\n")] {
            host.expect_put_file()
                .withf(move |_, w| {
                    w.path == path
                        && w.content == content
                        && w.branch == "main"
                        && w.message == format!("Add {path}")
                })
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let outcome = publisher(&host, 1)
            .publish_files(&repo(), &three_files())
            .await
            .unwrap();
        assert_eq!(outcome.branch, "main");
        assert_eq!(outcome.written, vec!["a", "b", "c"]);
        assert!(outcome.abandoned.is_empty());
    }

    #[tokio::test]
    async fn publish_falls_back_with_whole_set() {
        let mut host = MockHost::new();
        host.expect_put_file()
            .withf(|_, w| w.branch == "main" && w.path == "a")
            .times(1)
            .returning(|_, _| Ok(()));
        host.expect_put_file()
            .withf(|_, w| w.branch == "main" && w.path == "b")
            .times(1)
            .returning(|_, _| {
                Err(HostError::Status {
                    status: 404,
                    body: "Branch not found".into(),
                })
            });
        host.expect_put_file()
            .withf(|_, w| w.branch == "master")
            .times(3)
            .returning(|_, _| Ok(()));

        let outcome = publisher(&host, 1)
            .publish_files(&repo(), &three_files())
            .await
            .unwrap();
        assert_eq!(outcome.branch, "master");
        assert_eq!(outcome.written, vec!["a", "b", "c"]);
        assert_eq!(outcome.abandoned.len(), 1);
        assert_eq!(outcome.abandoned[0].branch, "main");
        assert_eq!(outcome.abandoned[0].written, vec!["a"]);
        assert_eq!(outcome.abandoned[0].failure.as_ref().unwrap().0, "b");
    }

    #[tokio::test]
    async fn publish_fails_after_fallback_fails() {
        let mut host = MockHost::new();
        host.expect_put_file()
            .withf(|_, w| w.branch == "main")
            .times(1)
            .returning(|_, _| Err(HostError::Transport("reset".into())));
        host.expect_put_file()
            .withf(|_, w| w.branch == "master" && w.path != "c")
            .times(2)
            .returning(|_, _| Ok(()));
        host.expect_put_file()
            .withf(|_, w| w.branch == "master" && w.path == "c")
            .times(1)
            .returning(|_, _| Err(HostError::Transport("reset".into())));

        let err = publisher(&host, 1)
            .publish_files(&repo(), &three_files())
            .await
            .unwrap_err();
        match err {
            PublishError::BranchesExhausted { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].written.is_empty());
                assert_eq!(attempts[1].written, vec!["a", "b"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_rejects_empty_set() {
        let host = MockHost::new();
        let err = publisher(&host, 1)
            .publish_files(&repo(), &FileSet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::EmptyFileSet));
    }

    #[tokio::test]
    async fn same_primary_and_fallback_is_tried_once() {
        let mut host = MockHost::new();
        host.expect_put_file()
            .times(1)
            .returning(|_, _| Err(HostError::Transport("reset".into())));

        let publisher = Publisher::new(
            &host,
            RepositoryNamer::default(),
            RetryConfig::immediate(1),
            BranchConfig {
                primary: "main".into(),
                fallback: "main".into(),
            },
        );
        let err = publisher
            .publish_files(&repo(), &three_files())
            .await
            .unwrap_err();
        match err {
            PublishError::BranchesExhausted { attempts } => assert_eq!(attempts.len(), 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
