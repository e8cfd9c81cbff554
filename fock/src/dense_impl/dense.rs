//! Dense Hermitian eigensolver

extern crate nalgebra as na;

use crate::comm::all_gather_c64;
use crate::eigen::Eigenpair;
use crate::error::{Error, Result};
use crate::hamiltonian_impl::SectorOperator;
use crate::vector::scatter;
use crate::C64;
use na::DMatrix;
use serde::Deserialize;
use tracing::info;

/// Dense solver settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DenseConfig {
    /// Largest dimension that may be densified.
    pub max_dim: usize,
    /// Number of lowest eigenpairs to return; all of them when unset.
    pub n_eigen: Option<usize>,
}

impl Default for DenseConfig {
    fn default() -> Self {
        DenseConfig {
            max_dim: 4000,
            n_eigen: None,
        }
    }
}

/// Assemble the full matrix of `op` on every rank. Collective.
pub fn dense_matrix(op: &dyn SectorOperator) -> Result<DMatrix<C64>> {
    let comm = op.comm();
    let ncols = op.column_partition().dim();
    let local = op.local_dense_rows()?;

    // row-major so that the gathered slices concatenate row blocks
    let flat = local.transpose();
    let counts: Vec<usize> = op
        .row_partition()
        .counts()
        .iter()
        .map(|&rows| rows * ncols)
        .collect();
    let all = all_gather_c64(comm, flat.as_slice(), &counts);
    Ok(DMatrix::from_row_slice(op.dim(), ncols, &all))
}

/// All (or the lowest `n_eigen`) eigenpairs of a Hermitian operator,
/// ascending, with eigenvectors sliced to the local partition.
pub fn diagonalize(op: &dyn SectorOperator, config: &DenseConfig) -> Result<Vec<Eigenpair>> {
    let dim = op.dim();
    if !op.is_square() {
        return Err(Error::DimensionMismatch {
            context: "dense diagonalization of a non-square operator",
            expected: dim,
            found: op.column_partition().dim(),
        });
    }
    if dim > config.max_dim {
        return Err(Error::DenseLimitExceeded {
            dim,
            limit: config.max_dim,
        });
    }
    let root = op.comm().is_root();
    if root {
        info!("===========================================");
        info!("        Dense Diagonalization");
        info!("===========================================");
        info!("Matrix dimension: {} x {}", dim, dim);
    }

    let h = dense_matrix(op)?;
    let hermitian = (&h + h.adjoint()) * C64::new(0.5, 0.0);
    let eigen = hermitian.symmetric_eigen();

    let mut order: Vec<usize> = (0..dim).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
    order.truncate(config.n_eigen.unwrap_or(dim).min(dim));

    let rank = op.comm().rank();
    let pairs: Vec<Eigenpair> = order
        .into_iter()
        .map(|k| Eigenpair {
            value: eigen.eigenvalues[k],
            vector: scatter(op.row_partition(), rank, &eigen.eigenvectors.column(k).into_owned()),
            converged: true,
        })
        .collect();

    if root {
        for (i, pair) in pairs.iter().take(10).enumerate() {
            info!("  State {}: E = {:.10}", i, pair.value);
        }
        if pairs.len() > 10 {
            info!("  ... {} more", pairs.len() - 10);
        }
        info!("===========================================");
    }
    Ok(pairs)
}
