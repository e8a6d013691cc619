//! Density clustering over a precomputed distance matrix.
//!
//! Default backend for semantic coupling. Classic DBSCAN: core points are
//! rows with at least `min_samples` neighbors within `eps`; clusters grow
//! by expanding reachable cores; everything else is labeled `-1` noise,
//! which downstream becomes either a shared bucket or singleton clusters
//! depending on configuration.

use super::{ClusteringBackend, NOISE_LABEL};
use crate::distance::PairwiseMatrix;

pub struct DensityBackend {
    eps: f64,
    min_samples: usize,
}

impl DensityBackend {
    pub fn new(eps: f64, min_samples: usize) -> Self {
        Self { eps, min_samples }
    }
}

impl Default for DensityBackend {
    fn default() -> Self {
        Self::new(0.5, 2)
    }
}

const UNVISITED: i32 = i32::MIN;

impl ClusteringBackend for DensityBackend {
    fn name(&self) -> &'static str {
        "density"
    }

    fn fit(&self, matrix: &PairwiseMatrix) -> Vec<i32> {
        let n = matrix.len();
        let mut labels = vec![UNVISITED; n];
        let mut next_label = 0;

        for point in 0..n {
            if labels[point] != UNVISITED {
                continue;
            }
            let neighbors = self.neighbors(matrix, point);
            if neighbors.len() < self.min_samples {
                labels[point] = NOISE_LABEL;
                continue;
            }

            labels[point] = next_label;
            let mut frontier = neighbors;
            while let Some(candidate) = frontier.pop() {
                if labels[candidate] == NOISE_LABEL {
                    // Border point previously dismissed as noise.
                    labels[candidate] = next_label;
                }
                if labels[candidate] != UNVISITED {
                    continue;
                }
                labels[candidate] = next_label;
                let reachable = self.neighbors(matrix, candidate);
                if reachable.len() >= self.min_samples {
                    frontier.extend(reachable);
                }
            }
            next_label += 1;
        }

        labels
    }
}

impl DensityBackend {
    /// Indices within `eps` of `point`, including `point` itself.
    fn neighbors(&self, matrix: &PairwiseMatrix, point: usize) -> Vec<usize> {
        (0..matrix.len())
            .filter(|&other| matrix.get(point, other) <= self.eps)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::MatrixKind;

    fn matrix(values: Vec<Vec<f64>>) -> PairwiseMatrix {
        let entities = (0..values.len()).map(|i| format!("e{i}")).collect();
        PairwiseMatrix::new(entities, values, MatrixKind::Distance)
    }

    #[test]
    fn dense_group_clusters_outlier_is_noise() {
        let m = matrix(vec![
            vec![0.0, 0.1, 0.2, 0.9],
            vec![0.1, 0.0, 0.1, 0.9],
            vec![0.2, 0.1, 0.0, 0.9],
            vec![0.9, 0.9, 0.9, 0.0],
        ]);
        let labels = DensityBackend::new(0.3, 2).fit(&m);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], NOISE_LABEL);
    }

    #[test]
    fn two_separate_dense_groups() {
        let far = 0.9;
        let m = matrix(vec![
            vec![0.0, 0.1, far, far],
            vec![0.1, 0.0, far, far],
            vec![far, far, 0.0, 0.1],
            vec![far, far, 0.1, 0.0],
        ]);
        let labels = DensityBackend::new(0.3, 2).fit(&m);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn all_noise_when_nothing_is_dense() {
        let m = matrix(vec![
            vec![0.0, 0.9, 0.9],
            vec![0.9, 0.0, 0.9],
            vec![0.9, 0.9, 0.0],
        ]);
        let labels = DensityBackend::new(0.3, 2).fit(&m);
        assert!(labels.iter().all(|&l| l == NOISE_LABEL));
    }

    #[test]
    fn empty_input() {
        assert!(DensityBackend::default().fit(&matrix(vec![])).is_empty());
    }
}
