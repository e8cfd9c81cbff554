//! Real symmetric tridiagonal projections.

extern crate nalgebra as na;

use na::{DMatrix, DVector};

/// Inverse iteration steps spent on each refined Ritz vector.
const REFINE_STEPS: usize = 2;

/// Ritz values closer than this fraction of the matrix scale are treated as
/// one cluster, whose refined vectors are kept mutually orthogonal.
const CLUSTER_TOL: f64 = 1e-3;

/// Diagonal `alpha` and off-diagonal `beta` of a Lanczos projection,
/// `beta[i]` coupling `alpha[i]` and `alpha[i + 1]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tridiagonal {
    pub alpha: Vec<f64>,
    pub beta: Vec<f64>,
}

impl Tridiagonal {
    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// Leading `m x m` block as a dense matrix.
    pub fn to_matrix(&self, m: usize) -> DMatrix<f64> {
        let mut t = DMatrix::zeros(m, m);
        for i in 0..m {
            t[(i, i)] = self.alpha[i];
            if i + 1 < m {
                t[(i, i + 1)] = self.beta[i];
                t[(i + 1, i)] = self.beta[i];
            }
        }
        t
    }

    /// Ritz values in ascending order.
    pub fn eigenvalues(&self) -> Vec<f64> {
        let m = self.len();
        if m == 0 {
            return Vec::new();
        }
        let mut values: Vec<f64> = self
            .to_matrix(m)
            .symmetric_eigenvalues()
            .iter()
            .copied()
            .collect();
        values.sort_by(f64::total_cmp);
        values
    }

    /// Ritz values (ascending) and the matching eigenvectors as columns.
    ///
    /// The vectors are only as accurate as the dense eigensolver; columns
    /// that feed residuals or Ritz vectors go through [`Tridiagonal::refine`].
    pub fn eigen(&self) -> (Vec<f64>, DMatrix<f64>) {
        let m = self.len();
        if m == 0 {
            return (Vec::new(), DMatrix::zeros(0, 0));
        }
        let eigen = self.to_matrix(m).symmetric_eigen();
        let mut order: Vec<usize> = (0..m).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
        let values = order.iter().map(|&k| eigen.eigenvalues[k]).collect();
        let vectors = DMatrix::from_fn(m, m, |i, j| eigen.eigenvectors[(i, order[j])]);
        (values, vectors)
    }

    /// Polish the given columns of `vectors` by inverse iteration on
    /// `T - θ I` and replace their `values` by Rayleigh quotients.
    ///
    /// Columns are processed in the given order. A refined column is
    /// orthogonalized against the previously refined columns of its cluster.
    pub fn refine(&self, values: &mut [f64], vectors: &mut DMatrix<f64>, columns: &[usize]) {
        let m = self.len();
        if m == 0 {
            return;
        }
        let t = self.to_matrix(m);
        let scale = self.scale().max(f64::MIN_POSITIVE);
        let mut done: Vec<usize> = Vec::with_capacity(columns.len());
        for &col in columns {
            let theta = values[col];
            // keep the shifted matrix away from exact singularity
            let shift = theta + 4.0 * f64::EPSILON * scale;
            let lu = (&t - DMatrix::<f64>::identity(m, m) * shift).lu();
            let cluster: Vec<usize> = done
                .iter()
                .copied()
                .filter(|&d| (values[d] - theta).abs() <= CLUSTER_TOL * scale)
                .collect();

            let mut s: DVector<f64> = vectors.column(col).into_owned();
            for _ in 0..REFINE_STEPS {
                let Some(mut y) = lu.solve(&s) else {
                    break;
                };
                for &d in &cluster {
                    let other = vectors.column(d);
                    let overlap = other.dot(&y);
                    y.axpy(-overlap, &other, 1.0);
                }
                let n = y.norm();
                if !n.is_finite() || n == 0.0 {
                    break;
                }
                s = y / n;
            }
            values[col] = s.dot(&(&t * &s));
            vectors.set_column(col, &s);
            done.push(col);
        }
    }

    /// Norm of `A x - θ x` for the Ritz vector built from column `col`,
    /// given the norm `beta_last` of the residual left after the last
    /// Lanczos step: `sqrt(|T s - θ s|² + (β s_m)²)`.
    pub fn ritz_residual(
        &self,
        theta: f64,
        vectors: &DMatrix<f64>,
        col: usize,
        beta_last: f64,
    ) -> f64 {
        let m = self.len();
        if m == 0 {
            return 0.0;
        }
        let s = vectors.column(col);
        let projected = (self.to_matrix(m) * &s - &s * theta).norm();
        projected.hypot(beta_last * s[m - 1])
    }

    /// Largest magnitude entry, used as the scale for breakdown tests.
    pub fn scale(&self) -> f64 {
        self.alpha
            .iter()
            .chain(&self.beta)
            .fold(0.0f64, |acc, x| acc.max(x.abs()))
    }
}
