//! Average-linkage agglomerative clustering with a distance threshold.
//!
//! Default backend for logical coupling. Starts from singletons and
//! repeatedly merges the closest pair of clusters until the closest pair is
//! farther apart than the threshold. Linkage is the average pairwise
//! distance between members. Every entity ends up in a cluster; this
//! backend never emits noise labels.

use super::ClusteringBackend;
use crate::distance::PairwiseMatrix;

pub struct AgglomerativeBackend {
    distance_threshold: f64,
}

impl AgglomerativeBackend {
    pub fn new(distance_threshold: f64) -> Self {
        Self { distance_threshold }
    }
}

impl Default for AgglomerativeBackend {
    fn default() -> Self {
        Self::new(0.95)
    }
}

impl ClusteringBackend for AgglomerativeBackend {
    fn name(&self) -> &'static str {
        "agglomerative"
    }

    fn fit(&self, matrix: &PairwiseMatrix) -> Vec<i32> {
        let n = matrix.len();
        if n == 0 {
            return Vec::new();
        }

        // Each cluster is a member-index list; merged clusters become None.
        let mut clusters: Vec<Option<Vec<usize>>> = (0..n).map(|i| Some(vec![i])).collect();

        loop {
            let mut best: Option<(usize, usize, f64)> = None;
            for a in 0..clusters.len() {
                let Some(members_a) = &clusters[a] else {
                    continue;
                };
                for b in (a + 1)..clusters.len() {
                    let Some(members_b) = &clusters[b] else {
                        continue;
                    };
                    let linkage = average_linkage(matrix, members_a, members_b);
                    if best.map_or(true, |(_, _, d)| linkage < d) {
                        best = Some((a, b, linkage));
                    }
                }
            }

            match best {
                Some((a, b, linkage)) if linkage <= self.distance_threshold => {
                    let absorbed = clusters[b].take().unwrap_or_default();
                    if let Some(members) = clusters[a].as_mut() {
                        members.extend(absorbed);
                    }
                }
                _ => break,
            }
        }

        let mut labels = vec![0; n];
        let mut next_label = 0;
        for members in clusters.into_iter().flatten() {
            for member in members {
                labels[member] = next_label;
            }
            next_label += 1;
        }
        labels
    }
}

fn average_linkage(matrix: &PairwiseMatrix, a: &[usize], b: &[usize]) -> f64 {
    let mut total = 0.0;
    for &i in a {
        for &j in b {
            total += matrix.get(i, j);
        }
    }
    total / (a.len() * b.len()) as f64
}
