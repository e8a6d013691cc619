//! Point queries: which lines elsewhere co-change with a given line range.
//!
//! Starting from the commits that touched the queried range, every line of
//! every file modified by those commits is probed with its own history
//! query. Probes fan out over a bounded worker pool and aggregate through a
//! concurrent map; a failing probe is logged and excluded instead of
//! aborting the batch. Related lines collapse into contiguous spans for
//! reporting.

use crate::history::HistoryProvider;
use crate::intervals::{Interval, IntervalSet};
use crate::model::IncidenceModel;
use anyhow::{Context, Result};
use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// The line range a related-lines query starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineQuery {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// A contiguous run of related lines in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedSpan {
    pub lines: Interval,
    /// Largest number of commits any line of the span shares with the query.
    pub shared_commits: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedLinesReport {
    pub query: LineQuery,
    /// Commits that touched the queried range, oldest first.
    pub touching_commits: Vec<String>,
    /// File -> spans whose history overlaps the touching commits.
    pub related: BTreeMap<String, Vec<RelatedSpan>>,
    /// Probes dropped because their history query failed.
    pub failed_queries: usize,
}

/// Runs the full related-lines analysis for `query`.
///
/// `max_workers` bounds the probe pool; the model supplies the candidate
/// files (those modified by any commit touching the queried range).
pub fn find_related_lines(
    provider: &(dyn HistoryProvider + Sync),
    model: &IncidenceModel,
    query: LineQuery,
    max_workers: usize,
) -> Result<RelatedLinesReport> {
    let touching_commits =
        provider.commits_touching_lines(query.start_line, query.end_line, &query.path)?;
    let target: HashSet<&str> = touching_commits.iter().map(String::as_str).collect();

    let mut candidate_files: Vec<String> = Vec::new();
    for hash in &touching_commits {
        let Some(entities) = model.entities_in_commit(hash) else {
            // A commit outside the model (bulk-dropped or unresolved) still
            // touched the range; it just contributes no candidates.
            continue;
        };
        for entity in entities {
            if !candidate_files.contains(entity) {
                candidate_files.push(entity.clone());
            }
        }
    }

    let probes: Vec<(String, u32)> = candidate_files
        .iter()
        .flat_map(|file| {
            let lines = provider.line_count(file);
            (1..=lines).map(move |line| (file.clone(), line))
        })
        .collect();

    let workers = max_workers.max(1).min(probes.len().max(1));
    log::info!(
        "Probing {} lines across {} files with {} workers",
        probes.len(),
        candidate_files.len(),
        workers
    );

    let shared: DashMap<(String, u32), usize> = DashMap::new();
    let failures = AtomicUsize::new(0);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("Failed to build line probe pool")?;
    pool.install(|| {
        probes.par_iter().for_each(|(file, line)| {
            match provider.commits_touching_lines(*line, *line, file) {
                Ok(commits) => {
                    let overlap = commits
                        .iter()
                        .filter(|c| target.contains(c.as_str()))
                        .count();
                    if overlap > 0 {
                        shared.insert((file.clone(), *line), overlap);
                    }
                }
                Err(e) => {
                    log::warn!("Dropping probe {file}:{line}: {e}");
                    failures.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
    });

    let mut per_file: BTreeMap<String, Vec<(u32, usize)>> = BTreeMap::new();
    for entry in shared.iter() {
        let (file, line) = entry.key().clone();
        per_file.entry(file).or_default().push((line, *entry.value()));
    }

    let related = per_file
        .into_iter()
        .map(|(file, lines)| {
            let spans = collapse_spans(&lines);
            (file, spans)
        })
        .collect();

    Ok(RelatedLinesReport {
        query,
        touching_commits,
        related,
        failed_queries: failures.into_inner(),
    })
}

/// Collapses `(line, shared_count)` pairs into contiguous spans; a span's
/// shared count is the maximum among its lines.
fn collapse_spans(lines: &[(u32, usize)]) -> Vec<RelatedSpan> {
    let set = IntervalSet::from_lines(lines.iter().map(|&(l, _)| l).collect());
    set.sorted()
        .into_iter()
        .map(|(start, end)| {
            let shared_commits = lines
                .iter()
                .filter(|&&(l, _)| start <= l && l <= end)
                .map(|&(_, n)| n)
                .max()
                .unwrap_or(0);
            RelatedSpan {
                lines: (start, end),
                shared_commits,
            }
        })
        .collect()
}
