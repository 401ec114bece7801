//! GitHub API client: the remote half of a reconciliation.
//!
//! Reads a CI file at a branch head and proposes a replacement as a
//! non-forced commit on top of that head, using the git data API
//! (ref → commit → tree → blob, then blob → tree → commit → ref).
//!
//! No retries. A rejected ref update is reported, never merged.

mod client;
mod store;

pub use client::{GithubClient, GithubError, TreeEntry};
pub use store::{commit_message, CommitOutcome, ConfigSink, ConfigSource, Locator, Snapshot};
