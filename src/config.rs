//! Analysis configuration.
//!
//! All knobs ship with working defaults; an optional `couplemap.toml` in the
//! working directory overrides them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum rename-chain hops followed before a path is declared unresolvable.
/// Guards against cyclic rename chains (A -> B -> A) in real histories.
pub const DEFAULT_RENAME_HOP_BOUND: usize = 50;

/// Upper bound on concurrent line-history point queries.
pub const DEFAULT_MAX_QUERY_WORKERS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// File extensions never modeled as entities (binary/image archives).
    pub excluded_extensions: Vec<String>,

    /// Rename-chain hop bound for identity resolution.
    pub rename_hop_bound: usize,

    /// Commits modifying more than this many files are dropped from the
    /// model. `None` keeps everything.
    pub bulk_commit_threshold: Option<usize>,

    /// When false, entities the clustering backend labels as noise each get
    /// a unique negative singleton label instead of sharing one bucket.
    pub join_clusterless_entities: bool,

    /// Distance threshold at which the default agglomerative backend stops
    /// merging.
    pub clustering_distance_threshold: f64,

    /// Worker cap for the related-lines point-query fan-out.
    pub max_query_workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            excluded_extensions: vec!["zip".into(), "gif".into(), "png".into()],
            rename_hop_bound: DEFAULT_RENAME_HOP_BOUND,
            bulk_commit_threshold: None,
            join_clusterless_entities: true,
            clustering_distance_threshold: 0.95,
            max_query_workers: DEFAULT_MAX_QUERY_WORKERS,
        }
    }
}

impl AnalysisConfig {
    /// Loads configuration from `couplemap.toml` in `dir`, falling back to
    /// defaults when the file does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join("couplemap.toml");
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// True when `path`'s extension is in the exclusion set.
    pub fn is_excluded_path(&self, path: &str) -> bool {
        match path.rsplit_once('.') {
            Some((_, ext)) => self
                .excluded_extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }
}
