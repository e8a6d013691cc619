//! Clustering adapter over pluggable backends.
//!
//! Backends are opaque: they take a pairwise matrix and return one integer
//! label per row, with `-1` reserved for "no cluster assigned". The adapter
//! normalizes that output into label -> members maps and decides what
//! happens to noise entities: either they share one unclustered bucket, or
//! each gets a unique synthetic negative label so every entity still has
//! exactly one membership downstream.

pub mod agglomerative;
pub mod density;

use crate::distance::{MatrixKind, PairwiseMatrix};
use std::collections::BTreeMap;

pub use agglomerative::AgglomerativeBackend;
pub use density::DensityBackend;

/// Label reserved by backends for unclustered entities.
pub const NOISE_LABEL: i32 = -1;

/// A pluggable clustering algorithm.
pub trait ClusteringBackend {
    fn name(&self) -> &'static str;

    /// True when the backend consumes distances; the adapter then converts
    /// a similarity matrix before fitting. Backends consuming similarity
    /// directly override this.
    fn wants_distance(&self) -> bool {
        true
    }

    /// One label per matrix row, `-1` for noise.
    fn fit(&self, matrix: &PairwiseMatrix) -> Vec<i32>;
}

/// Normalized clustering output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clustering {
    /// Label -> members, in input order within each cluster.
    pub clusters: BTreeMap<i32, Vec<String>>,
    /// Per-entity labels aligned to the matrix row order.
    pub labels: Vec<i32>,
    /// Entities aligned to `labels`.
    pub entities: Vec<String>,
}

impl Clustering {
    pub fn label_of(&self, entity: &str) -> Option<i32> {
        self.entities
            .iter()
            .position(|e| e == entity)
            .map(|i| self.labels[i])
    }
}

/// Runs `backend` over `matrix` and normalizes its labels.
///
/// With `join_clusterless` set, noise entities share the `-1` bucket;
/// otherwise each receives a unique negative singleton label chosen below
/// every real label so no collision is possible.
pub fn cluster(
    matrix: PairwiseMatrix,
    backend: &dyn ClusteringBackend,
    join_clusterless: bool,
) -> Clustering {
    let matrix = if backend.wants_distance() && matrix.kind() == MatrixKind::Similarity {
        matrix.into_distance()
    } else {
        matrix
    };

    let raw_labels = backend.fit(&matrix);
    debug_assert_eq!(raw_labels.len(), matrix.len());
    log::debug!(
        "{} produced {} raw labels",
        backend.name(),
        raw_labels.len()
    );

    let mut next_singleton = raw_labels
        .iter()
        .filter(|&&l| l != NOISE_LABEL)
        .min()
        .map_or(NOISE_LABEL, |&m| m.min(0) - 1);

    let mut clusters: BTreeMap<i32, Vec<String>> = BTreeMap::new();
    let mut labels = Vec::with_capacity(raw_labels.len());

    for (entity, &raw) in matrix.entities().iter().zip(&raw_labels) {
        let label = if raw == NOISE_LABEL && !join_clusterless {
            let label = next_singleton;
            next_singleton -= 1;
            label
        } else {
            raw
        };
        labels.push(label);
        clusters.entry(label).or_default().push(entity.clone());
    }

    Clustering {
        clusters,
        labels,
        entities: matrix.entities().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::MatrixKind;

    struct FixedLabels(Vec<i32>);

    impl ClusteringBackend for FixedLabels {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn fit(&self, _matrix: &PairwiseMatrix) -> Vec<i32> {
            self.0.clone()
        }
    }

    fn matrix(entities: &[&str]) -> PairwiseMatrix {
        let n = entities.len();
        PairwiseMatrix::new(
            entities.iter().map(|e| e.to_string()).collect(),
            vec![vec![0.0; n]; n],
            MatrixKind::Distance,
        )
    }

    #[test]
    fn joined_noise_shares_one_bucket() {
        let clustering = cluster(
            matrix(&["a", "b", "c", "d"]),
            &FixedLabels(vec![0, -1, 0, -1]),
            true,
        );
        assert_eq!(clustering.clusters[&0], vec!["a", "c"]);
        assert_eq!(clustering.clusters[&-1], vec!["b", "d"]);
        assert_eq!(clustering.labels, vec![0, -1, 0, -1]);
    }

    #[test]
    fn split_noise_gets_unique_negative_singletons() {
        let clustering = cluster(
            matrix(&["a", "b", "c", "d"]),
            &FixedLabels(vec![0, -1, 0, -1]),
            false,
        );
        assert_eq!(clustering.labels[0], 0);
        assert_eq!(clustering.labels[2], 0);
        let noise_a = clustering.labels[1];
        let noise_b = clustering.labels[3];
        assert!(noise_a < 0 && noise_b < 0);
        assert_ne!(noise_a, noise_b);
        assert_eq!(clustering.clusters[&noise_a], vec!["b"]);
        // Every entity has exactly one membership.
        let total: usize = clustering.clusters.values().map(Vec::len).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn singleton_labels_avoid_real_negative_labels() {
        let clustering = cluster(
            matrix(&["a", "b", "c"]),
            &FixedLabels(vec![-3, -1, -1]),
            false,
        );
        assert_eq!(clustering.labels[0], -3);
        assert!(clustering.labels[1] < -3);
        assert_ne!(clustering.labels[1], clustering.labels[2]);
    }

    #[test]
    fn real_labels_are_not_renumbered() {
        let clustering = cluster(
            matrix(&["a", "b", "c"]),
            &FixedLabels(vec![7, 3, 7]),
            true,
        );
        assert_eq!(clustering.clusters[&7], vec!["a", "c"]);
        assert_eq!(clustering.clusters[&3], vec!["b"]);
    }
}
