//! Read/commit contract for remote CI files, and its GitHub implementation.

use crate::client::{GithubClient, GithubError};

/// Where a CI file lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    /// `owner/name`
    pub repo: String,
    pub branch: String,
    pub path: String,
}

impl Locator {
    pub fn new(repo: impl Into<String>, branch: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            branch: branch.into(),
            path: path.into(),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.repo, self.branch, self.path)
    }
}

/// A file as read at a specific branch head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub locator: Locator,
    /// Commit the branch pointed to when the file was read.
    pub head_commit: String,
    /// Tree of `head_commit`.
    pub base_tree: String,
    pub text: String,
}

/// Result of proposing a new file version.
#[derive(Debug)]
pub enum CommitOutcome {
    Committed { commit: String },
    /// The remote refused or failed the write. Nothing was merged or retried.
    Rejected(GithubError),
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

pub trait ConfigSource {
    /// Current contents of the file. `NotFound` if branch or path is missing.
    fn fetch(&self, locator: &Locator) -> Result<Snapshot, GithubError>;
}

pub trait ConfigSink {
    /// Replace the file's contents, on top of the head it was read at.
    fn commit(&self, snapshot: &Snapshot, new_text: &str, message: &str) -> CommitOutcome;
}

/// Commit message for an automatic matrix update.
pub fn commit_message(package: &str, version: &str, path: &str) -> String {
    format!("New dependency {package} {version} found! Auto update {path}")
}

impl ConfigSource for GithubClient {
    fn fetch(&self, locator: &Locator) -> Result<Snapshot, GithubError> {
        let head_commit = self.branch_head(&locator.repo, &locator.branch)?;
        let base_tree = self.commit_tree(&locator.repo, &head_commit)?;

        let entry = self
            .list_tree(&locator.repo, &base_tree)?
            .into_iter()
            .find(|e| e.path == locator.path && e.kind == "blob")
            .ok_or_else(|| {
                GithubError::NotFound(format!(
                    "repository {} doesn't contain a file named '{}'",
                    locator.repo, locator.path
                ))
            })?;

        let text = self.blob_text(&locator.repo, &entry.sha)?;
        tracing::debug!(target_file = %locator, head = %head_commit, "fetched CI file");

        Ok(Snapshot {
            locator: locator.clone(),
            head_commit,
            base_tree,
            text,
        })
    }
}

impl ConfigSink for GithubClient {
    fn commit(&self, snapshot: &Snapshot, new_text: &str, message: &str) -> CommitOutcome {
        let loc = &snapshot.locator;
        let result = self
            .create_blob(&loc.repo, new_text)
            .and_then(|blob| self.create_tree(&loc.repo, &snapshot.base_tree, &loc.path, &blob))
            .and_then(|tree| self.create_commit(&loc.repo, message, &snapshot.head_commit, &tree))
            .and_then(|commit| {
                self.update_branch(&loc.repo, &loc.branch, &commit)?;
                Ok(commit)
            });

        match result {
            Ok(commit) => {
                tracing::info!(target_file = %loc, %commit, "pushed matrix update");
                CommitOutcome::Committed { commit }
            }
            Err(e) => {
                tracing::warn!(target_file = %loc, error = %e, "push rejected");
                CommitOutcome::Rejected(e)
            }
        }
    }
}
