//! Repository acquisition.
//!
//! Remote references (`git@...`, `https://...`) are cloned into a temporary
//! directory owned for the lifetime of the analysis; local paths are used in
//! place. Parsing the repository name out of a malformed URL is the one
//! fatal startup error of the acquisition step.

use crate::errors::CouplemapError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A resolved repository location.
pub struct RepoLocation {
    url: String,
    root: PathBuf,
    name: String,
    // Keeps the clone directory alive for remote repositories.
    _clone_dir: Option<TempDir>,
}

impl RepoLocation {
    /// Resolves `url` to a local working directory, cloning if remote.
    pub fn open(url: &str) -> Result<Self> {
        let name = repo_name_from_url(url)?;

        if is_remote(url) {
            let clone_dir = TempDir::new().context("Failed to create clone directory")?;
            let root = clone_dir.path().join(&name);
            log::info!("Cloning {url}");
            let output = Command::new("git")
                .arg("clone")
                .arg(url)
                .arg(&root)
                .output()
                .context("Failed to run git clone")?;
            if !output.status.success() {
                return Err(CouplemapError::CloneFailed {
                    url: url.to_string(),
                    reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                }
                .into());
            }
            Ok(Self {
                url: url.to_string(),
                root,
                name,
                _clone_dir: Some(clone_dir),
            })
        } else {
            let root = PathBuf::from(url);
            let check = Command::new("git")
                .args(["rev-parse", "--git-dir"])
                .current_dir(&root)
                .output()
                .with_context(|| format!("Failed to verify git repository at {url}"))?;
            if !check.status.success() {
                return Err(CouplemapError::NotARepository(root).into());
            }
            Ok(Self {
                url: url.to_string(),
                root,
                name,
                _clone_dir: None,
            })
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_remote(&self) -> bool {
        is_remote(&self.url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Whether `repo` refers to a remote repository rather than a local path.
pub fn is_remote(repo: &str) -> bool {
    repo.starts_with("git@") || repo.starts_with("https://")
}

/// Parses the repository name out of a url or path: the text between the
/// last `/` and a trailing `.git` suffix, if any.
pub fn repo_name_from_url(url: &str) -> Result<String> {
    let last_slash = url.rfind('/');
    let suffix = url.rfind(".git").unwrap_or(url.len());

    match last_slash {
        Some(slash) if suffix > slash + 1 => Ok(url[slash + 1..suffix].to_string()),
        None if !url.is_empty() && suffix > 0 => Ok(url[..suffix].to_string()),
        _ => Err(CouplemapError::MalformedRepositoryUrl(url.to_string()).into()),
    }
}
