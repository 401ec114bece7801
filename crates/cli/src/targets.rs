//! Notification targets: what happens when a tracked package ships.
//!
//! The dispatcher hands every target a single [`Notification`]. Targets never
//! see the feed or each other.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bumpwatch_config::{TargetConfig, TargetKind};
use bumpwatch_github::{commit_message, CommitOutcome, ConfigSink, ConfigSource, GithubError, Locator};
use bumpwatch_matrix::{reconcile_document, DocumentOutcome, MatrixError};

/// A release of a tracked package, paired with one configured target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub name: String,
    pub version: String,
    pub released_on: DateTime<Utc>,
    pub target: TargetConfig,
}

impl Notification {
    pub fn locator(&self) -> Locator {
        Locator::new(&self.target.repo, &self.target.branch, &self.target.file)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TargetOutcome {
    /// The matrix already covers this release.
    Unchanged,
    /// The matrix has no variable for this package.
    Untracked,
    Committed { commit: String },
    /// The remote refused the write.
    Rejected { reason: String },
    /// Would have committed these lines.
    DryRun { lines: Vec<String> },
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error(transparent)]
    Github(#[from] GithubError),

    #[error("{locator}: {source}")]
    Matrix {
        locator: String,
        #[source]
        source: MatrixError,
    },

    #[error("no target registered for kind '{0}'")]
    Unregistered(TargetKind),
}

pub trait NotificationTarget {
    fn notify(&self, notification: &Notification) -> Result<TargetOutcome, NotifyError>;
}

// ── GitOps ──────────────────────────────────────────────────────────

/// Reconciles the target's CI file and commits the result.
pub struct GitOpsTarget<S> {
    store: S,
    dry_run: bool,
}

impl<S: ConfigSource + ConfigSink> GitOpsTarget<S> {
    pub fn new(store: S) -> Self {
        Self { store, dry_run: false }
    }

    /// Reconcile but never commit.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

impl<S: ConfigSource + ConfigSink> NotificationTarget for GitOpsTarget<S> {
    fn notify(&self, n: &Notification) -> Result<TargetOutcome, NotifyError> {
        let locator = n.locator();
        let snapshot = self.store.fetch(&locator)?;

        let reconciliation =
            reconcile_document(&snapshot.text, &n.name, &n.version).map_err(|source| {
                NotifyError::Matrix {
                    locator: locator.to_string(),
                    source,
                }
            })?;

        let (text, lines, change) = match reconciliation.outcome {
            DocumentOutcome::Unchanged if !reconciliation.tracked => {
                tracing::warn!(
                    target_file = %locator,
                    variable = %reconciliation.variable,
                    "package is watched but its variable is not in the matrix"
                );
                return Ok(TargetOutcome::Untracked);
            }
            DocumentOutcome::Unchanged => {
                tracing::info!(target_file = %locator, package = %n.name, version = %n.version, "matrix already up to date");
                return Ok(TargetOutcome::Unchanged);
            }
            DocumentOutcome::Updated { text, lines, change } => (text, lines, change),
        };

        if self.dry_run {
            tracing::info!(target_file = %locator, %change, lines = lines.len(), "dry run, not committing");
            return Ok(TargetOutcome::DryRun { lines });
        }

        let message = commit_message(&n.name, &n.version, &locator.path);
        Ok(match self.store.commit(&snapshot, &text, &message) {
            CommitOutcome::Committed { commit } => TargetOutcome::Committed { commit },
            CommitOutcome::Rejected(e) => TargetOutcome::Rejected { reason: e.to_string() },
        })
    }
}

// ── Logging ─────────────────────────────────────────────────────────

/// Records the release and touches nothing.
#[derive(Debug, Default)]
pub struct LoggingTarget;

impl NotificationTarget for LoggingTarget {
    fn notify(&self, n: &Notification) -> Result<TargetOutcome, NotifyError> {
        tracing::info!(
            package = %n.name,
            version = %n.version,
            released_on = %n.released_on.to_rfc3339(),
            repo = %n.target.repo,
            branch = %n.target.branch,
            file = %n.target.file,
            "new release"
        );
        Ok(TargetOutcome::Unchanged)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory store shared by the target and dispatcher tests.

    use std::cell::RefCell;
    use std::collections::HashMap;

    use bumpwatch_github::{CommitOutcome, ConfigSink, ConfigSource, GithubError, Locator, Snapshot};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Pushed {
        pub locator: Locator,
        pub parent: String,
        pub text: String,
        pub message: String,
    }

    #[derive(Default)]
    pub struct MemoryStore {
        pub files: HashMap<Locator, String>,
        pub reject_with: Option<String>,
        pub pushed: RefCell<Vec<Pushed>>,
    }

    impl MemoryStore {
        pub fn with_file(locator: Locator, text: &str) -> Self {
            let mut store = Self::default();
            store.files.insert(locator, text.to_string());
            store
        }
    }

    impl ConfigSource for MemoryStore {
        fn fetch(&self, locator: &Locator) -> Result<Snapshot, GithubError> {
            let text = self
                .files
                .get(locator)
                .ok_or_else(|| GithubError::NotFound(locator.to_string()))?;
            Ok(Snapshot {
                locator: locator.clone(),
                head_commit: "head".into(),
                base_tree: "tree".into(),
                text: text.clone(),
            })
        }
    }

    impl ConfigSink for MemoryStore {
        fn commit(&self, snapshot: &Snapshot, new_text: &str, message: &str) -> CommitOutcome {
            if let Some(reason) = &self.reject_with {
                return CommitOutcome::Rejected(GithubError::WriteConflict(reason.clone()));
            }
            let mut pushed = self.pushed.borrow_mut();
            pushed.push(Pushed {
                locator: snapshot.locator.clone(),
                parent: snapshot.head_commit.clone(),
                text: new_text.to_string(),
                message: message.to_string(),
            });
            CommitOutcome::Committed {
                commit: format!("commit-{}", pushed.len()),
            }
        }
    }
}
