//! Lanczos eigensolver with periodic full re-orthogonalization.

use super::tridiag::Tridiagonal;
use crate::eigen::{Eigenpair, Which};
use crate::error::{Error, Result};
use crate::hamiltonian_impl::SectorOperator;
use crate::vector::{dotc, norm, normalize, project_out, random_state, scale, StateVector};
use crate::C64;
use serde::Deserialize;
use tracing::{debug, info};

/// Relative size below which a new Krylov direction counts as zero.
const BREAKDOWN_TOL: f64 = 1e-12;

/// Lanczos solver settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LanczosConfig {
    /// Number of wanted eigenpairs.
    pub n_eigen: usize,
    /// Cap on the Krylov dimension.
    pub max_iter: usize,
    /// Tolerance on the change of the wanted Ritz values between checks,
    /// and on each pair's residual relative to `max(|θ|, 1)`.
    pub tol: f64,
    /// Re-orthogonalize against the whole basis every this many steps
    /// (1 = every step, 0 = never).
    pub reorth_every: usize,
    /// Diagonalize the projection every this many steps.
    pub check_every: usize,
    pub which: Which,
    /// Seed of the random start vector.
    pub seed: u64,
}

impl Default for LanczosConfig {
    fn default() -> Self {
        LanczosConfig {
            n_eigen: 1,
            max_iter: 500,
            tol: 1e-10,
            reorth_every: 1,
            check_every: 5,
            which: Which::SmallestAlgebraic,
            seed: 1,
        }
    }
}

/// Progress of one Lanczos run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanczosState {
    Initializing,
    Iterating,
    Converged,
    MaxIterReached,
    Failed,
}

/// Ritz pairs of a finished run.
#[derive(Debug, Clone)]
pub struct LanczosResult {
    /// Wanted eigenpairs, ascending.
    pub eigenpairs: Vec<Eigenpair>,
    /// `Converged` or `MaxIterReached`.
    pub state: LanczosState,
    /// Krylov dimension reached.
    pub iterations: usize,
    /// Ritz residuals `|H x - θ x|`, same order as `eigenpairs`.
    pub residuals: Vec<f64>,
    pub tridiagonal: Tridiagonal,
}

impl LanczosResult {
    /// Fail with `NonConvergence` unless the run converged.
    pub fn into_converged(self) -> Result<Self> {
        match self.state {
            LanczosState::Converged => Ok(self),
            _ => Err(Error::NonConvergence {
                iterations: self.iterations,
                residual: self.residuals.iter().fold(0.0, |a: f64, &b| a.max(b)),
            }),
        }
    }
}

fn validate(op: &dyn SectorOperator, config: &LanczosConfig) -> Result<()> {
    if !op.is_square() {
        return Err(Error::InvalidArgument(
            "Lanczos needs a square operator".to_string(),
        ));
    }
    if config.n_eigen == 0 || config.n_eigen > op.dim() {
        return Err(Error::InvalidArgument(format!(
            "requested {} eigenpairs of a {}-dimensional sector",
            config.n_eigen,
            op.dim()
        )));
    }
    if config.max_iter < config.n_eigen || config.check_every == 0 {
        return Err(Error::InvalidArgument(format!(
            "max_iter ({}) must cover n_eigen ({}) and check_every must be positive",
            config.max_iter, config.n_eigen
        )));
    }
    Ok(())
}

/// Lowest (or highest) `n_eigen` eigenpairs of a Hermitian operator.
/// Collective.
///
/// Starts from `start` when given (normalized here) or from a seeded random
/// vector. Reaching `max_iter` is not an error: the result carries
/// `MaxIterReached` and the current Ritz pairs.
pub fn lanczos(
    op: &dyn SectorOperator,
    config: &LanczosConfig,
    start: Option<&StateVector>,
) -> Result<LanczosResult> {
    let mut state = LanczosState::Initializing;
    validate(op, config)?;
    let comm = op.comm();
    let root = comm.is_root();
    let dim = op.dim();

    let mut v0 = match start {
        Some(v) if v.len() != op.local_dim() => {
            return Err(Error::DimensionMismatch {
                context: "Lanczos start vector",
                expected: op.local_dim(),
                found: v.len(),
            })
        }
        Some(v) => v.clone(),
        None => random_state(op.row_partition(), comm.rank(), config.seed),
    };
    let n0 = normalize(comm, &mut v0);
    if n0 == 0.0 {
        debug!("Lanczos state {:?} -> {:?}", state, LanczosState::Failed);
        return Err(Error::KrylovBreakdown {
            iteration: 0,
            norm: n0,
        });
    }

    let max_krylov = config.max_iter.min(dim);
    if root {
        info!("===========================================");
        info!("        Lanczos Eigensolver");
        info!("===========================================");
        info!("Dimension: {}", dim);
        info!("Wanted eigenpairs: {} ({:?})", config.n_eigen, config.which);
        info!("Max Krylov dimension: {}", max_krylov);
        info!("Tolerance: {:.2e}", config.tol);
    }

    let mut basis: Vec<StateVector> = vec![v0];
    let mut tri = Tridiagonal::default();
    let mut previous: Option<Vec<f64>> = None;
    let last_beta;
    state = LanczosState::Iterating;

    loop {
        let j = basis.len() - 1;
        let mut w = op.apply(&basis[j])?;
        let alpha = dotc(comm, &basis[j], &w).re;
        w.axpy(C64::new(-alpha, 0.0), &basis[j], C64::new(1.0, 0.0));
        if j > 0 {
            let beta = tri.beta[j - 1];
            w.axpy(C64::new(-beta, 0.0), &basis[j - 1], C64::new(1.0, 0.0));
        }
        tri.alpha.push(alpha);

        if config.reorth_every > 0 && (j + 1) % config.reorth_every == 0 {
            for _ in 0..2 {
                let coeffs = project_out(comm, &mut w, &basis);
                tri.alpha[j] += coeffs[j].re;
            }
        }
        let m = j + 1;
        let beta = norm(comm, &w);

        if beta <= BREAKDOWN_TOL * tri.scale().max(1.0) {
            if m >= config.n_eigen {
                debug!("Invariant Krylov subspace of dimension {}", m);
                state = LanczosState::Converged;
                last_beta = 0.0;
                break;
            }
            debug!("Lanczos state {:?} -> {:?}", state, LanczosState::Failed);
            return Err(Error::KrylovBreakdown {
                iteration: m,
                norm: beta,
            });
        }

        if m >= config.n_eigen && (m % config.check_every == 0 || m == max_krylov) {
            let values = tri.eigenvalues();
            let wanted: Vec<f64> = config
                .which
                .select(&values, config.n_eigen)
                .into_iter()
                .map(|k| values[k])
                .collect();
            debug!("Lanczos step {}: wanted Ritz values {:?}", m, wanted);
            let stable = previous.as_ref().is_some_and(|prev| {
                wanted
                    .iter()
                    .zip(prev)
                    .all(|(a, b)| (a - b).abs() <= config.tol * a.abs().max(1.0))
            });
            if stable {
                state = LanczosState::Converged;
                last_beta = beta;
                break;
            }
            previous = Some(wanted);
        }

        if m == max_krylov {
            // a full-dimensional Krylov space is exact
            if m == dim {
                state = LanczosState::Converged;
                last_beta = 0.0;
            } else {
                state = LanczosState::MaxIterReached;
                last_beta = beta;
            }
            break;
        }

        scale(&mut w, C64::new(1.0 / beta, 0.0));
        tri.beta.push(beta);
        basis.push(w);
    }
    let iterations = tri.len();
    let (mut values, mut vectors) = tri.eigen();
    let mut picked = config.which.select(&values, config.n_eigen);
    tri.refine(&mut values, &mut vectors, &picked);
    picked.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let local_dim = op.local_dim();
    let mut eigenpairs = Vec::with_capacity(picked.len());
    let mut residuals = Vec::with_capacity(picked.len());
    for k in picked {
        let mut vector = StateVector::zeros(local_dim);
        for (i, q) in basis.iter().enumerate() {
            vector.axpy(C64::new(vectors[(i, k)], 0.0), q, C64::new(1.0, 0.0));
        }
        normalize(comm, &mut vector);
        let residual = tri.ritz_residual(values[k], &vectors, k, last_beta);
        let converged = residual <= config.tol * values[k].abs().max(1.0);
        residuals.push(residual);
        eigenpairs.push(Eigenpair {
            value: values[k],
            vector,
            converged,
        });
    }

    if root {
        info!("Lanczos finished: {:?} after {} iterations", state, iterations);
        for (i, pair) in eigenpairs.iter().enumerate() {
            info!(
                "  State {}: E = {:.10} (residual {:.2e})",
                i, pair.value, residuals[i]
            );
        }
        info!("===========================================");
    }

    Ok(LanczosResult {
        eigenpairs,
        state,
        iterations,
        residuals,
        tridiagonal: tri,
    })
}
