//! Error taxonomy for couplemap.
//!
//! Construction-time failures (repository acquisition, malformed references)
//! abort the run. Per-item failures during bulk analysis are caught at the
//! query site, logged, and excluded from aggregate results; they never reach
//! this enum.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CouplemapError {
    /// The repository reference has no parseable name, e.g. a URL without a
    /// trailing `name` or `name.git` segment. Fatal at startup.
    #[error("Badly formatted repository url: {0}")]
    MalformedRepositoryUrl(String),

    /// The given location exists but is not a git repository.
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// Cloning a remote repository failed.
    #[error("Failed to clone {url}: {reason}")]
    CloneFailed { url: String, reason: String },

    /// A git subprocess exited unsuccessfully during full traversal.
    #[error("git {command} failed: {reason}")]
    GitCommand { command: String, reason: String },

    /// An unknown coupling strategy name was selected.
    #[error("Wrong couplings type: {0} (expected 'logical' or 'semantic')")]
    UnknownStrategy(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CouplemapError>;
