//! Weighted co-change graph and its entropy score.
//!
//! Nodes are entities touched by at least one commit; edges count how many
//! commits touched both endpoints. Untouched entities and zero-weight edges
//! are absent by construction. `StableUnGraph` keeps node indices valid
//! across the removals performed by merge simulation, and `Clone` gives the
//! deep copies that simulation requires.

pub mod simulate;

use crate::model::{IncidenceModel, ENTITY_DELIMITER};
use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub name: String,
    pub modification_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeData {
    pub co_modification_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CouplingGraph {
    graph: StableUnGraph<NodeData, EdgeData>,
    index: HashMap<String, NodeIndex>,
}

impl CouplingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from the incidence model, one commit at a time.
    pub fn from_model(model: &IncidenceModel) -> Self {
        let mut graph = Self::new();
        for hash in model.commit_hashes() {
            if let Some(entities) = model.entities_in_commit(hash) {
                graph.record_commit(entities);
            }
        }
        graph
    }

    /// Folds one commit's resolved entities into the graph: every entity's
    /// modification count goes up by one, every pair's co-modification
    /// count goes up by one (edges spring into existence at weight 1).
    pub fn record_commit(&mut self, entities: &[String]) {
        for entity in entities {
            let node = self.ensure_node(entity);
            if let Some(data) = self.graph.node_weight_mut(node) {
                data.modification_count += 1;
            }
        }
        for (i, a) in entities.iter().enumerate() {
            for b in &entities[i + 1..] {
                self.increment_edge(a, b, 1);
            }
        }
    }

    fn ensure_node(&mut self, entity: &str) -> NodeIndex {
        match self.index.get(entity) {
            Some(&node) => node,
            None => {
                let node = self.graph.add_node(NodeData {
                    name: entity.to_string(),
                    modification_count: 0,
                });
                self.index.insert(entity.to_string(), node);
                node
            }
        }
    }

    /// Adds `weight` to the edge between `a` and `b`, creating nodes and
    /// edge as needed.
    pub fn increment_edge(&mut self, a: &str, b: &str, weight: u32) {
        let node_a = self.ensure_node(a);
        let node_b = self.ensure_node(b);
        match self.graph.find_edge(node_a, node_b) {
            Some(edge) => {
                if let Some(data) = self.graph.edge_weight_mut(edge) {
                    data.co_modification_count += weight;
                }
            }
            None => {
                self.graph.add_edge(
                    node_a,
                    node_b,
                    EdgeData {
                        co_modification_count: weight,
                    },
                );
            }
        }
    }

    /// Inserts a node without touching counters; used when rebuilding
    /// composite nodes during merge simulation.
    pub fn insert_node(&mut self, entity: &str, modification_count: u32) {
        let node = self.ensure_node(entity);
        if let Some(data) = self.graph.node_weight_mut(node) {
            data.modification_count = modification_count;
        }
    }

    pub fn remove_node(&mut self, entity: &str) -> bool {
        match self.index.remove(entity) {
            Some(node) => self.graph.remove_node(node).is_some(),
            None => false,
        }
    }

    pub fn contains(&self, entity: &str) -> bool {
        self.index.contains_key(entity)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn modification_count(&self, entity: &str) -> Option<u32> {
        let &node = self.index.get(entity)?;
        self.graph.node_weight(node).map(|d| d.modification_count)
    }

    pub fn co_modification_count(&self, a: &str, b: &str) -> Option<u32> {
        let &node_a = self.index.get(a)?;
        let &node_b = self.index.get(b)?;
        let edge = self.graph.find_edge(node_a, node_b)?;
        self.graph.edge_weight(edge).map(|d| d.co_modification_count)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.graph.node_weights()
    }

    /// Neighbor names and edge weights of `entity`.
    pub fn neighbors(&self, entity: &str) -> Vec<(String, u32)> {
        let Some(&node) = self.index.get(entity) else {
            return Vec::new();
        };
        self.graph
            .edges(node)
            .filter_map(|edge| {
                let other = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                let name = self.graph.node_weight(other)?.name.clone();
                Some((name, edge.weight().co_modification_count))
            })
            .collect()
    }

    /// Structural entropy: `Σ_node size(node) × Σ_neighbor co_modifications`.
    ///
    /// A size-weighted coupling cost, not a probabilistic entropy; only
    /// before/after comparisons of candidate merges are meaningful. Each
    /// edge contributes to both endpoints' sums; the double-count is kept
    /// for parity with the established metric.
    pub fn entropy(&self, line_count: &dyn Fn(&str) -> u32) -> u64 {
        self.graph
            .node_indices()
            .map(|node| {
                let Some(data) = self.graph.node_weight(node) else {
                    return 0;
                };
                let size = entity_size(&data.name, line_count) as u64;
                let coupling: u64 = self
                    .graph
                    .edges(node)
                    .map(|e| e.weight().co_modification_count as u64)
                    .sum();
                size * coupling
            })
            .sum()
    }
}

/// Line count of an entity; composite keys sum their constituents.
pub fn entity_size(entity: &str, line_count: &dyn Fn(&str) -> u32) -> u32 {
    entity
        .split(ENTITY_DELIMITER)
        .map(line_count)
        .sum()
}
