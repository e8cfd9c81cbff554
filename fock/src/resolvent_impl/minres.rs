//! Shifted MINRES for complex shifts

use crate::error::{Error, Result};
use crate::hamiltonian_impl::SectorOperator;
use crate::vector::{dotc, norm, scale, StateVector};
use crate::C64;
use serde::Deserialize;
use tracing::debug;

/// Resolvent solver settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResolventConfig {
    /// Relative residual `|b - (z - H) x| / |b|` to reach.
    pub tol: f64,
    pub max_iter: usize,
}

impl Default for ResolventConfig {
    fn default() -> Self {
        ResolventConfig {
            tol: 1e-8,
            max_iter: 1000,
        }
    }
}

/// Solution of one shifted system.
#[derive(Debug, Clone)]
pub struct ResolventResult {
    /// Local slice of `x`.
    pub solution: StateVector,
    pub iterations: usize,
    /// Relative residual tracked by the recurrence.
    pub residual_estimate: f64,
    /// Relative residual recomputed from `x` with one extra product; the
    /// convergence flag is decided on this value.
    pub residual: f64,
    pub converged: bool,
}

impl ResolventResult {
    /// Fail with `NonConvergence` unless the tolerance was met.
    pub fn into_converged(self) -> Result<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(Error::NonConvergence {
                iterations: self.iterations,
                residual: self.residual,
            })
        }
    }
}

/// Givens rotation `(c, s)` with `conj(c) a + conj(s) b = r` real and
/// `-s a + c b = 0`.
fn givens(a: C64, b: C64) -> (C64, C64, f64) {
    let r = (a.norm_sqr() + b.norm_sqr()).sqrt();
    if r == 0.0 {
        return (C64::new(1.0, 0.0), C64::new(0.0, 0.0), 0.0);
    }
    (a / r, b / r, r)
}

/// `|b - (H - z) y| / |b|`. Collective.
fn shifted_residual(
    op: &dyn SectorOperator,
    z: C64,
    y: &StateVector,
    rhs: &StateVector,
    beta0: f64,
) -> Result<f64> {
    let mut r = op.apply(y)?;
    r.axpy(-z, y, C64::new(1.0, 0.0));
    let r = rhs - r;
    Ok(norm(op.comm(), &r) / beta0)
}

/// `(E0 + ω + iη - H) x = b`. Collective.
pub fn solve(
    op: &dyn SectorOperator,
    e0: f64,
    omega: f64,
    eta: f64,
    rhs: &StateVector,
    config: &ResolventConfig,
) -> Result<ResolventResult> {
    solve_at(op, C64::new(e0 + omega, eta), rhs, config)
}

/// `(z - H) x = b` for an arbitrary complex `z`. Collective.
///
/// Internally `(H - z) y = b` is solved and `x = -y` returned.
pub fn solve_at(
    op: &dyn SectorOperator,
    z: C64,
    rhs: &StateVector,
    config: &ResolventConfig,
) -> Result<ResolventResult> {
    let comm = op.comm();
    if !op.is_square() {
        return Err(Error::InvalidArgument(
            "resolvent of a non-square operator".to_string(),
        ));
    }
    if rhs.len() != op.local_dim() {
        return Err(Error::DimensionMismatch {
            context: "resolvent right-hand side",
            expected: op.local_dim(),
            found: rhs.len(),
        });
    }
    let zero = C64::new(0.0, 0.0);
    let one = C64::new(1.0, 0.0);
    let n = rhs.len();
    let beta0 = norm(comm, rhs);
    if beta0 == 0.0 {
        return Ok(ResolventResult {
            solution: StateVector::zeros(n),
            iterations: 0,
            residual_estimate: 0.0,
            residual: 0.0,
            converged: true,
        });
    }

    let mut v = rhs.clone();
    scale(&mut v, C64::new(1.0 / beta0, 0.0));
    let mut v_prev = StateVector::zeros(n);
    let mut beta_prev = 0.0;

    let mut y = StateVector::zeros(n);
    let mut w1 = StateVector::zeros(n);
    let mut w2 = StateVector::zeros(n);
    // rotations of the two previous columns
    let (mut ca, mut sa) = (one, zero);
    let (mut cb, mut sb) = (one, zero);
    let mut phi = C64::new(beta0, 0.0);
    let mut estimate = 1.0;
    let mut iterations = 0;
    let mut checked = None;
    let mut iterations_at_check = 0;

    while iterations < config.max_iter {
        iterations += 1;
        let mut u = op.apply(&v)?;
        if beta_prev != 0.0 {
            u.axpy(C64::new(-beta_prev, 0.0), &v_prev, one);
        }
        let alpha = dotc(comm, &v, &u).re;
        u.axpy(C64::new(-alpha, 0.0), &v, one);
        let beta = norm(comm, &u);

        // new column of the shifted tridiagonal: β_prev, α - z, β
        let upper = C64::new(beta_prev, 0.0);
        let diag = C64::new(alpha, 0.0) - z;
        let eps = sa.conj() * upper;
        let delta_bar = ca * upper;
        let delta = cb.conj() * delta_bar + sb.conj() * diag;
        let gamma_bar = -sb * delta_bar + cb * diag;
        let (c, s, gamma) = givens(gamma_bar, C64::new(beta, 0.0));
        if gamma == 0.0 {
            debug!("Shifted MINRES hit a singular projection at step {}", iterations);
            break;
        }

        let tau = c.conj() * phi;
        phi = -s * phi;

        // w = (v - δ w1 - ε w2) / γ
        let mut w = v.clone();
        w.axpy(-delta, &w1, one);
        w.axpy(-eps, &w2, one);
        scale(&mut w, C64::new(1.0 / gamma, 0.0));
        y.axpy(tau, &w, one);

        w2 = std::mem::replace(&mut w1, w);
        ca = cb;
        sa = sb;
        cb = c;
        sb = s;

        estimate = phi.norm() / beta0;
        if iterations % 50 == 0 {
            debug!("Shifted MINRES step {}: residual estimate {:.3e}", iterations, estimate);
        }
        let exhausted = beta <= 1e-14 * alpha.abs().max(beta_prev).max(1.0);
        if estimate <= config.tol || exhausted {
            let r = shifted_residual(op, z, &y, rhs, beta0)?;
            checked = Some(r);
            iterations_at_check = iterations;
            if r <= config.tol || exhausted {
                break;
            }
            debug!(
                "Shifted MINRES step {}: estimate {:.3e} but residual {:.3e}, continuing",
                iterations, estimate, r
            );
        }
        scale(&mut u, C64::new(1.0 / beta, 0.0));
        v_prev = std::mem::replace(&mut v, u);
        beta_prev = beta;
    }

    // y is unchanged since the last check when the loop broke on it
    let residual = match checked {
        Some(r) if iterations_at_check == iterations => r,
        _ => shifted_residual(op, z, &y, rhs, beta0)?,
    };
    // x = -y solves (z - H) x = b
    scale(&mut y, -one);
    let converged = residual <= config.tol;
    debug!(
        "Resolvent at z = {:.4}: {} iterations, residual {:.3e} (estimate {:.3e})",
        z, iterations, residual, estimate
    );

    Ok(ResolventResult {
        solution: y,
        iterations,
        residual_estimate: estimate,
        residual,
        converged,
    })
}
