//! Eigenpair containers shared by the diagonalizers.

use crate::vector::StateVector;
use serde::Deserialize;

/// Which end of the spectrum a solver targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Which {
    #[default]
    SmallestAlgebraic,
    LargestAlgebraic,
}

impl Which {
    /// Indices of the `n` wanted values of `values`, ordered from most to
    /// least wanted.
    pub fn select(self, values: &[f64], n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        if self == Which::LargestAlgebraic {
            order.reverse();
        }
        order.truncate(n);
        order
    }
}

/// Eigenvalue with its eigenvector slice on the calling rank.
#[derive(Debug, Clone)]
pub struct Eigenpair {
    pub value: f64,
    pub vector: StateVector,
    pub converged: bool,
}
