//! Pairwise distance/similarity matrices over entities.
//!
//! Two strategies share the [`DistanceProvider`] contract: logical coupling
//! (Jaccard over incidence rows) and semantic coupling (TF-IDF cosine over
//! an identifier corpus). The semantic provider hands back a *similarity*
//! matrix; converting it to a distance is deliberately left to the
//! clustering adapter, because some backends consume similarity directly.

pub mod logical;
pub mod semantic;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use logical::LogicalDistanceProvider;
pub use semantic::{Corpus, SemanticDistanceProvider};

/// Which coupling signal drives distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CouplingStrategy {
    #[default]
    Logical,
    Semantic,
}

impl fmt::Display for CouplingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logical => write!(f, "logical"),
            Self::Semantic => write!(f, "semantic"),
        }
    }
}

impl std::str::FromStr for CouplingStrategy {
    type Err = crate::errors::CouplemapError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "logical" => Ok(Self::Logical),
            "semantic" => Ok(Self::Semantic),
            other => Err(crate::errors::CouplemapError::UnknownStrategy(
                other.to_string(),
            )),
        }
    }
}

/// Whether matrix cells hold distances (0 = identical) or similarities
/// (1 = identical).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Distance,
    Similarity,
}

/// A symmetric entity-by-entity matrix with values in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct PairwiseMatrix {
    entities: Vec<String>,
    values: Vec<Vec<f64>>,
    kind: MatrixKind,
}

impl PairwiseMatrix {
    pub fn new(entities: Vec<String>, values: Vec<Vec<f64>>, kind: MatrixKind) -> Self {
        debug_assert_eq!(entities.len(), values.len());
        Self {
            entities,
            values,
            kind,
        }
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }

    pub fn kind(&self) -> MatrixKind {
        self.kind
    }

    /// The explicit similarity-to-distance conversion (`1 - s`), performed
    /// at most once, by the clustering adapter. Distance matrices pass
    /// through unchanged.
    pub fn into_distance(self) -> PairwiseMatrix {
        match self.kind {
            MatrixKind::Distance => self,
            MatrixKind::Similarity => {
                let values = self
                    .values
                    .into_iter()
                    .map(|row| row.into_iter().map(|s| 1.0 - s).collect())
                    .collect();
                PairwiseMatrix {
                    entities: self.entities,
                    values,
                    kind: MatrixKind::Distance,
                }
            }
        }
    }
}

/// Polymorphic distance computation over the chosen coupling strategy.
pub trait DistanceProvider {
    fn strategy(&self) -> CouplingStrategy;

    /// Produces the pairwise matrix. Re-derivable purely from the incidence
    /// model or the lexical corpus; never mutated in place afterwards.
    fn get_distance_matrix(&self) -> Result<PairwiseMatrix>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_known_names_only() {
        assert_eq!(
            "logical".parse::<CouplingStrategy>().unwrap(),
            CouplingStrategy::Logical
        );
        assert_eq!(
            "semantic".parse::<CouplingStrategy>().unwrap(),
            CouplingStrategy::Semantic
        );
        assert!("lexical".parse::<CouplingStrategy>().is_err());
    }

    #[test]
    fn similarity_inverts_once_distance_passes_through() {
        let matrix = PairwiseMatrix::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 0.25], vec![0.25, 1.0]],
            MatrixKind::Similarity,
        );
        let distance = matrix.into_distance();
        assert_eq!(distance.kind(), MatrixKind::Distance);
        assert!((distance.get(0, 1) - 0.75).abs() < 1e-12);
        assert!((distance.get(0, 0)).abs() < 1e-12);

        let unchanged = distance.clone().into_distance();
        assert!((unchanged.get(0, 1) - 0.75).abs() < 1e-12);
    }
}
