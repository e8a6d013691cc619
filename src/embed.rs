//! Planar embedding of the pairwise distance matrix.
//!
//! The visualization wants one `(x, y)` per entity such that pairwise
//! screen distance roughly tracks coupling distance. The default backend is
//! classical multidimensional scaling: double-center the squared distance
//! matrix and take its two dominant eigenpairs by power iteration. Fully
//! deterministic, no randomized initialization.

use crate::distance::{MatrixKind, PairwiseMatrix};

pub trait EmbeddingBackend {
    fn name(&self) -> &'static str;

    /// One planar coordinate per matrix row, in row order.
    fn fit_transform(&self, matrix: &PairwiseMatrix) -> Vec<(f64, f64)>;
}

pub struct ClassicalMdsBackend {
    iterations: usize,
}

impl ClassicalMdsBackend {
    pub fn new(iterations: usize) -> Self {
        Self { iterations }
    }
}

impl Default for ClassicalMdsBackend {
    fn default() -> Self {
        Self::new(200)
    }
}

impl EmbeddingBackend for ClassicalMdsBackend {
    fn name(&self) -> &'static str {
        "classical-mds"
    }

    fn fit_transform(&self, matrix: &PairwiseMatrix) -> Vec<(f64, f64)> {
        let n = matrix.len();
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![(0.0, 0.0)];
        }

        let distance_at = |i: usize, j: usize| match matrix.kind() {
            MatrixKind::Distance => matrix.get(i, j),
            MatrixKind::Similarity => 1.0 - matrix.get(i, j),
        };

        // B = -1/2 J D^2 J, the double-centered squared distance matrix.
        let squared: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| distance_at(i, j).powi(2)).collect())
            .collect();
        let row_means: Vec<f64> = squared
            .iter()
            .map(|row| row.iter().sum::<f64>() / n as f64)
            .collect();
        let grand_mean = row_means.iter().sum::<f64>() / n as f64;
        let mut b: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| -0.5 * (squared[i][j] - row_means[i] - row_means[j] + grand_mean))
                    .collect()
            })
            .collect();

        let (first_value, first_vector) = dominant_eigenpair(&b, self.iterations);
        deflate(&mut b, first_value, &first_vector);
        let (second_value, second_vector) = dominant_eigenpair(&b, self.iterations);

        let scale_x = first_value.max(0.0).sqrt();
        let scale_y = second_value.max(0.0).sqrt();
        (0..n)
            .map(|i| (first_vector[i] * scale_x, second_vector[i] * scale_y))
            .collect()
    }
}

/// Dominant eigenvalue and unit eigenvector of a symmetric matrix by power
/// iteration from a fixed deterministic start.
fn dominant_eigenpair(matrix: &[Vec<f64>], iterations: usize) -> (f64, Vec<f64>) {
    let n = matrix.len();
    let mut vector: Vec<f64> = (0..n)
        .map(|i| ((i * 31 + 17) % 101) as f64 / 101.0 - 0.5)
        .collect();
    normalize(&mut vector);

    for _ in 0..iterations {
        let mut next = multiply(matrix, &vector);
        if normalize(&mut next) == 0.0 {
            return (0.0, vec![0.0; n]);
        }
        vector = next;
    }

    let image = multiply(matrix, &vector);
    let value = vector.iter().zip(&image).map(|(v, i)| v * i).sum();
    (value, vector)
}

fn multiply(matrix: &[Vec<f64>], vector: &[f64]) -> Vec<f64> {
    matrix
        .iter()
        .map(|row| row.iter().zip(vector).map(|(m, v)| m * v).sum())
        .collect()
}

fn normalize(vector: &mut [f64]) -> f64 {
    let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
    norm
}

/// Removes a known eigenpair so the next power iteration finds the runner-up.
fn deflate(matrix: &mut [Vec<f64>], value: f64, vector: &[f64]) {
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell -= value * vector[i] * vector[j];
        }
    }
}
