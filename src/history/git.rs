//! Git-backed history provider.
//!
//! Shells out to `git` rather than linking libgit2: traversal is a single
//! `git log --reverse --name-status` pass, point queries use `git log -L`.

use super::{CommitRecord, FileModification, HistoryProvider};
use crate::errors::CouplemapError;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::Command;

const COMMIT_MARKER: &str = "@commit";

pub struct GitHistoryProvider {
    repo_root: PathBuf,
}

impl GitHistoryProvider {
    pub fn new(repo_root: PathBuf) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--git-dir"])
            .current_dir(&repo_root)
            .output()
            .context("Failed to verify git repository")?;
        if !output.status.success() {
            return Err(CouplemapError::NotARepository(repo_root).into());
        }
        Ok(Self { repo_root })
    }

    /// Total number of commits reachable from HEAD.
    pub fn total_commits(&self) -> Result<usize> {
        let stdout = self.git(&["rev-list", "--count", "HEAD"], "rev-list")?;
        stdout
            .trim()
            .parse()
            .context("Unparseable rev-list --count output")
    }

    /// Name of the currently checked-out branch.
    pub fn active_branch(&self) -> Result<String> {
        let stdout = self.git(&["rev-parse", "--abbrev-ref", "HEAD"], "rev-parse")?;
        Ok(stdout.trim().to_string())
    }

    fn git(&self, args: &[&str], command: &str) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .output()
            .with_context(|| format!("Failed to run git {command}"))?;
        if !output.status.success() {
            return Err(CouplemapError::GitCommand {
                command: command.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl HistoryProvider for GitHistoryProvider {
    fn traverse_commits(&self) -> Result<Vec<CommitRecord>> {
        let stdout = self.git(
            &[
                "log",
                "--reverse",
                "-M",
                "--name-status",
                &format!("--format={COMMIT_MARKER}%x09%H%x09%cI"),
            ],
            "log --name-status",
        )?;
        parse_name_status_log(&stdout)
    }

    fn snapshot_files(&self) -> Result<Vec<String>> {
        let stdout = self.git(&["ls-files"], "ls-files")?;
        Ok(stdout.lines().map(str::to_string).collect())
    }

    fn commits_touching_lines(
        &self,
        start_line: u32,
        end_line: u32,
        path: &str,
    ) -> Result<Vec<String>> {
        let range = format!("{start_line},{end_line}:{path}");
        let stdout = self.git(&["log", "-L", &range, "--format=%H", "-s"], "log -L")?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn line_count(&self, path: &str) -> u32 {
        match std::fs::read(self.repo_root.join(path)) {
            Ok(bytes) if bytes.is_empty() => 0,
            Ok(bytes) => {
                let newlines = bytes.iter().filter(|&&b| b == b'\n').count() as u32;
                if bytes.ends_with(b"\n") {
                    newlines
                } else {
                    newlines + 1
                }
            }
            Err(_) => 0,
        }
    }

    fn root(&self) -> &Path {
        &self.repo_root
    }
}

/// Parses `git log --reverse --name-status --format=@commit\t%H\t%cI` output
/// into chronological commit records.
fn parse_name_status_log(stdout: &str) -> Result<Vec<CommitRecord>> {
    let mut commits: Vec<CommitRecord> = Vec::new();

    for line in stdout.lines() {
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(COMMIT_MARKER) {
            let mut fields = rest.split('\t').filter(|f| !f.is_empty());
            let hash = fields
                .next()
                .context("Commit line missing hash")?
                .to_string();
            let date = fields.next().context("Commit line missing date")?;
            let timestamp = DateTime::parse_from_rfc3339(date)
                .with_context(|| format!("Unparseable commit date {date}"))?
                .with_timezone(&Utc);
            commits.push(CommitRecord {
                hash,
                timestamp,
                modifications: Vec::new(),
            });
            continue;
        }

        let commit = match commits.last_mut() {
            Some(commit) => commit,
            // Tolerate noise before the first marker.
            None => continue,
        };
        if let Some(modification) = parse_name_status_line(line) {
            commit.modifications.push(modification);
        }
    }

    Ok(commits)
}

/// Parses one `--name-status` line. Returns `None` for unrecognized statuses.
fn parse_name_status_line(line: &str) -> Option<FileModification> {
    let mut fields = line.split('\t');
    let status = fields.next()?;
    let first = fields.next()?.to_string();
    let second = fields.next().map(str::to_string);

    match status.chars().next()? {
        'A' => Some(FileModification {
            old_path: None,
            new_path: Some(first),
        }),
        'M' | 'T' => Some(FileModification {
            old_path: Some(first.clone()),
            new_path: Some(first),
        }),
        'D' => Some(FileModification {
            old_path: Some(first),
            new_path: None,
        }),
        // Rx / Cx carry a similarity score after the letter.
        'R' | 'C' => Some(FileModification {
            old_path: Some(first),
            new_path: Some(second?),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LOG: &str = "@commit\taaa111\t2021-03-01T10:00:00+00:00\n\
\n\
A\tsrc/lib.rs\n\
A\tREADME.md\n\
@commit\tbbb222\t2021-03-02T11:30:00+01:00\n\
\n\
M\tsrc/lib.rs\n\
R100\tREADME.md\tdocs/README.md\n\
@commit\tccc333\t2021-03-03T09:00:00+00:00\n\
\n\
D\tsrc/lib.rs\n";

    #[test]
    fn parses_commits_in_order_with_modifications() {
        let commits = parse_name_status_log(SAMPLE_LOG).unwrap();
        assert_eq!(commits.len(), 3);
        assert_eq!(commits[0].hash, "aaa111");
        assert_eq!(commits[0].modifications.len(), 2);
        assert_eq!(
            commits[0].modifications[0],
            FileModification {
                old_path: None,
                new_path: Some("src/lib.rs".into()),
            }
        );

        let rename = &commits[1].modifications[1];
        assert_eq!(rename.old_path.as_deref(), Some("README.md"));
        assert_eq!(rename.new_path.as_deref(), Some("docs/README.md"));

        let deletion = &commits[2].modifications[0];
        assert_eq!(deletion.old_path.as_deref(), Some("src/lib.rs"));
        assert_eq!(deletion.new_path, None);
    }

    #[test]
    fn parses_timezone_into_utc() {
        let commits = parse_name_status_log(SAMPLE_LOG).unwrap();
        assert_eq!(
            commits[1].timestamp,
            DateTime::parse_from_rfc3339("2021-03-02T10:30:00+00:00").unwrap()
        );
    }

    #[test]
    fn unrecognized_status_is_skipped() {
        assert!(parse_name_status_line("X\tweird").is_none());
        assert!(parse_name_status_line("").is_none());
    }

    #[test]
    fn commit_without_modifications_is_kept() {
        let log = "@commit\tddd444\t2021-04-01T00:00:00+00:00\n";
        let commits = parse_name_status_log(log).unwrap();
        assert_eq!(commits.len(), 1);
        assert!(commits[0].modifications.is_empty());
    }
}
