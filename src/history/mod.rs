//! Commit-history provider boundary.
//!
//! The analysis engine consumes an ordered stream of [`CommitRecord`]s and
//! ad-hoc "which commits touched these lines" point queries. The git-backed
//! implementation lives in [`git`]; everything downstream depends only on
//! the [`HistoryProvider`] trait.

pub mod git;
pub mod repo;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

pub use git::GitHistoryProvider;
pub use repo::RepoLocation;

/// One file modification within a commit.
///
/// `old_path` is `None` for newly added files; `new_path` is `None` for
/// deletions. A rename carries both, with differing paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileModification {
    pub old_path: Option<String>,
    pub new_path: Option<String>,
}

/// A commit as seen by the analysis engine.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub hash: String,
    pub timestamp: DateTime<Utc>,
    pub modifications: Vec<FileModification>,
}

/// Read-only access to a repository's history.
pub trait HistoryProvider {
    /// All commits in chronological order (oldest first). The order must be
    /// stable and total; it need not be topological across merge commits.
    fn traverse_commits(&self) -> Result<Vec<CommitRecord>>;

    /// Paths of files in the current snapshot, relative to the repo root.
    fn snapshot_files(&self) -> Result<Vec<String>>;

    /// Hashes of commits in which the given line range of `path` was
    /// modified. A failure here is a per-query failure: callers log and
    /// exclude it rather than aborting the batch.
    fn commits_touching_lines(&self, start_line: u32, end_line: u32, path: &str)
        -> Result<Vec<String>>;

    /// Line count of a snapshot file. Missing or unreadable files count 0.
    fn line_count(&self, path: &str) -> u32;

    /// Repository working directory.
    fn root(&self) -> &Path;
}
