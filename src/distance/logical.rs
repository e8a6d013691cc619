//! Logical coupling: Jaccard distance over incidence rows.

use super::{CouplingStrategy, DistanceProvider, MatrixKind, PairwiseMatrix};
use crate::model::IncidenceModel;
use anyhow::Result;

pub struct LogicalDistanceProvider<'a> {
    model: &'a IncidenceModel,
}

impl<'a> LogicalDistanceProvider<'a> {
    pub fn new(model: &'a IncidenceModel) -> Self {
        Self { model }
    }
}

impl DistanceProvider for LogicalDistanceProvider<'_> {
    fn strategy(&self) -> CouplingStrategy {
        CouplingStrategy::Logical
    }

    fn get_distance_matrix(&self) -> Result<PairwiseMatrix> {
        let entities = self.model.entities().to_vec();
        let n = entities.len();
        let mut values = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = jaccard_distance(self.model.row_by_index(i), self.model.row_by_index(j));
                values[i][j] = d;
                values[j][i] = d;
            }
        }

        Ok(PairwiseMatrix::new(entities, values, MatrixKind::Distance))
    }
}

/// `1 - |a AND b| / |a OR b|` over 0/1 rows. Two all-zero rows are treated
/// as identical (distance 0) rather than dividing by zero.
fn jaccard_distance(a: &[u8], b: &[u8]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut intersection = 0usize;
    let mut union = 0usize;
    for (&x, &y) in a.iter().zip(b) {
        if x == 1 || y == 1 {
            union += 1;
            if x == 1 && y == 1 {
                intersection += 1;
            }
        }
    }
    if union == 0 {
        0.0
    } else {
        1.0 - intersection as f64 / union as f64
    }
}
