//! What-if merge simulation and refactoring candidate evaluation.
//!
//! A simulated merge never mutates the live graph or model: both are deep
//! copied, the merged pair becomes one composite node named by joining the
//! parts with the entity delimiter, and the composite's edges are recomputed
//! from the incidence columns rather than summed from the old edges. The
//! entropy delta between the original and merged graph is what gets
//! reported; accepting or rejecting a candidate is the caller's call.

use super::{entity_size, CouplingGraph};
use crate::cluster::Clustering;
use crate::intervals::IntervalSet;
use crate::model::{IncidenceModel, ENTITY_DELIMITER};
use std::collections::{BTreeMap, HashMap};

/// A cluster worth restructuring around, with its simulated entropy effect.
#[derive(Debug, Clone)]
pub struct RefactoringCandidate {
    pub label: i32,
    pub members: Vec<String>,
    /// Commits touching every member simultaneously.
    pub common_commits: usize,
    /// Per file, the line ranges implicated, pooled lines included.
    pub file_lines: BTreeMap<String, IntervalSet>,
    pub baseline_entropy: u64,
    pub merged_entropy: u64,
    /// Negative when the merge reduces coupling cost.
    pub entropy_delta: i64,
}

/// Splits an entity key into its file path and optional line number.
pub fn entity_location(entity: &str) -> (&str, Option<u32>) {
    if let Some((path, suffix)) = entity.rsplit_once(ENTITY_DELIMITER) {
        if let Ok(line) = suffix.parse::<u32>() {
            return (path, Some(line));
        }
    }
    (entity, None)
}

/// Replaces `a` and `b` with one composite node in deep copies of the graph
/// and model. The composite's edge weights are recomputed from the commits
/// touching either constituent. Returns `None` when either entity is absent
/// from the model.
pub fn merge_nodes(
    graph: &CouplingGraph,
    model: &IncidenceModel,
    a: &str,
    b: &str,
) -> Option<(CouplingGraph, IncidenceModel, String)> {
    let composite = format!("{a}{ENTITY_DELIMITER}{b}");
    let merged_model = model.merge_entities(a, b, &composite)?;

    let row_a = model.row(a)?;
    let row_b = model.row(b)?;

    // Co-modification counts of the composite against every other entity,
    // read straight off the incidence columns.
    let mut connections: HashMap<&str, u32> = HashMap::new();
    for column in 0..model.commit_count() {
        if row_a[column] == 0 && row_b[column] == 0 {
            continue;
        }
        for (index, entity) in model.entities().iter().enumerate() {
            if entity == a || entity == b {
                continue;
            }
            if model.row_by_index(index)[column] == 1 {
                *connections.entry(entity.as_str()).or_insert(0) += 1;
            }
        }
    }

    let mut merged_graph = graph.clone();
    merged_graph.remove_node(a);
    merged_graph.remove_node(b);
    merged_graph.insert_node(
        &composite,
        merged_model.modification_count(&composite) as u32,
    );
    for (neighbor, weight) in connections {
        merged_graph.increment_edge(&composite, neighbor, weight);
    }

    Some((merged_graph, merged_model, composite))
}

/// Simulates merging all of `entities` into one composite node, pairwise
/// left to right. Returns the merged graph's entropy, or the baseline when
/// fewer than two entities remain after dropping unknowns.
pub fn simulate_cluster_merge(
    graph: &CouplingGraph,
    model: &IncidenceModel,
    entities: &[String],
    line_count: &dyn Fn(&str) -> u32,
) -> u64 {
    let known: Vec<&String> = entities
        .iter()
        .filter(|e| model.row(e).is_some())
        .collect();
    if known.len() < 2 {
        return graph.entropy(line_count);
    }

    let mut current = known[0].clone();
    let mut sim_graph = graph.clone();
    let mut sim_model = model.clone();
    for entity in &known[1..] {
        match merge_nodes(&sim_graph, &sim_model, &current, entity) {
            Some((next_graph, next_model, composite)) => {
                sim_graph = next_graph;
                sim_model = next_model;
                current = composite;
            }
            None => break,
        }
    }
    sim_graph.entropy(line_count)
}

/// Evaluates every cluster and returns the interesting ones with their
/// simulated entropy effect.
///
/// A cluster is interesting when it has at least two members and at least
/// two commits touch all of them together. The remaining clusters form a
/// pool: their line ranges are folded into each interesting cluster's
/// report wherever the file paths overlap.
pub fn evaluate_candidates(
    clustering: &Clustering,
    model: &IncidenceModel,
    graph: &CouplingGraph,
    line_count: &dyn Fn(&str) -> u32,
) -> Vec<RefactoringCandidate> {
    let mut interesting: Vec<(i32, &Vec<String>, usize)> = Vec::new();
    let mut pooled_lines: HashMap<String, IntervalSet> = HashMap::new();

    for (&label, members) in &clustering.clusters {
        let common = model.common_commit_count(members);
        if members.len() >= 2 && common >= 2 {
            interesting.push((label, members, common));
        } else {
            for member in members {
                let (path, line) = entity_location(member);
                if let Some(line) = line {
                    pooled_lines
                        .entry(path.to_string())
                        .or_default()
                        .insert((line, line));
                }
            }
        }
    }

    let baseline_entropy = graph.entropy(line_count);
    log::debug!(
        "{} of {} clusters qualify for simulation, baseline entropy {}",
        interesting.len(),
        clustering.clusters.len(),
        baseline_entropy
    );

    interesting
        .into_iter()
        .map(|(label, members, common_commits)| {
            let mut file_lines: BTreeMap<String, IntervalSet> = BTreeMap::new();
            for member in members {
                let (path, line) = entity_location(member);
                let set = file_lines.entry(path.to_string()).or_default();
                if let Some(line) = line {
                    set.insert((line, line));
                }
            }
            // Fold in pooled lines from clusters that did not qualify.
            for (path, set) in &mut file_lines {
                if let Some(pooled) = pooled_lines.get(path) {
                    for &interval in pooled.iter() {
                        set.insert(interval);
                    }
                }
            }

            let mut paths: Vec<String> = Vec::new();
            for member in members {
                let (path, _) = entity_location(member);
                if !paths.iter().any(|p| p == path) {
                    paths.push(path.to_string());
                }
            }
            // Line-grained members of one file merge trivially; simulate on
            // the member entities themselves, which the model knows about.
            let merge_targets = if paths.len() >= 2 {
                members.clone()
            } else {
                Vec::new()
            };
            let merged_entropy = if merge_targets.len() >= 2 {
                simulate_cluster_merge(graph, model, &merge_targets, line_count)
            } else {
                baseline_entropy
            };

            RefactoringCandidate {
                label,
                members: members.clone(),
                common_commits,
                file_lines,
                baseline_entropy,
                merged_entropy,
                entropy_delta: merged_entropy as i64 - baseline_entropy as i64,
            }
        })
        .collect()
}

/// Composite size for reporting: sum of constituent line counts.
pub fn candidate_size(candidate: &RefactoringCandidate, line_count: &dyn Fn(&str) -> u32) -> u32 {
    candidate
        .members
        .iter()
        .map(|m| entity_size(entity_location(m).0, line_count))
        .sum()
}
