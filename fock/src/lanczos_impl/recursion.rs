//! Continued-fraction expansion of Green's function elements.

use crate::error::{Error, Result};
use crate::hamiltonian_impl::SectorOperator;
use crate::vector::{dotc, norm, scale, StateVector};
use crate::C64;
use std::f64::consts::PI;
use tracing::debug;

/// `G(z) = norm2 / (z - α0 - β0² / (z - α1 - β1² / ...))`, i.e.
/// `⟨v|(z - H)⁻¹|v⟩` for the start vector `v` with `norm2 = ⟨v|v⟩`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContinuedFraction {
    pub norm2: f64,
    pub alpha: Vec<f64>,
    pub beta: Vec<f64>,
}

impl ContinuedFraction {
    /// Depth of the fraction.
    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// Evaluate the fraction bottom-up at complex energy `z`.
    pub fn green(&self, z: C64) -> C64 {
        let mut tail = C64::new(0.0, 0.0);
        let mut g = C64::new(0.0, 0.0);
        for i in (0..self.alpha.len()).rev() {
            let denom = z - self.alpha[i] - tail;
            if i == 0 {
                g = C64::new(self.norm2, 0.0) / denom;
            } else {
                tail = C64::new(self.beta[i - 1] * self.beta[i - 1], 0.0) / denom;
            }
        }
        g
    }

    /// `-Im G(ω + e0 + iη) / π`.
    pub fn spectral_function(&self, omega: f64, e0: f64, eta: f64) -> f64 {
        -self.green(C64::new(omega + e0, eta)).im / PI
    }

    pub fn spectrum(&self, omegas: &[f64], e0: f64, eta: f64) -> Vec<f64> {
        omegas
            .iter()
            .map(|&omega| self.spectral_function(omega, e0, eta))
            .collect()
    }
}

/// Run `n_steps` three-term Lanczos steps from `start` and return the
/// continued-fraction coefficients. Collective.
///
/// A zero start vector gives an empty fraction (`G = 0`). The recursion stops
/// early on an invariant subspace, where the fraction is exact.
pub fn continued_fraction(
    op: &dyn SectorOperator,
    start: &StateVector,
    n_steps: usize,
) -> Result<ContinuedFraction> {
    let comm = op.comm();
    if start.len() != op.local_dim() {
        return Err(Error::DimensionMismatch {
            context: "continued-fraction start vector",
            expected: op.local_dim(),
            found: start.len(),
        });
    }
    let n0 = norm(comm, start);
    let mut cf = ContinuedFraction {
        norm2: n0 * n0,
        alpha: Vec::new(),
        beta: Vec::new(),
    };
    if n0 == 0.0 {
        return Ok(cf);
    }

    let steps = n_steps.min(op.dim());
    let mut v = start.clone();
    scale(&mut v, C64::new(1.0 / n0, 0.0));
    let mut v_prev = StateVector::zeros(v.len());
    let mut beta_prev = 0.0;

    for j in 0..steps {
        let mut w = op.apply(&v)?;
        if j > 0 {
            w.axpy(C64::new(-beta_prev, 0.0), &v_prev, C64::new(1.0, 0.0));
        }
        let alpha = dotc(comm, &v, &w).re;
        w.axpy(C64::new(-alpha, 0.0), &v, C64::new(1.0, 0.0));
        cf.alpha.push(alpha);
        if j + 1 == steps {
            break;
        }
        let beta = norm(comm, &w);
        let scale_ref = alpha.abs().max(beta_prev).max(1.0);
        if beta <= 1e-12 * scale_ref {
            debug!("Recursion terminated on an invariant subspace after {} steps", j + 1);
            break;
        }
        cf.beta.push(beta);
        scale(&mut w, C64::new(1.0 / beta, 0.0));
        v_prev = std::mem::replace(&mut v, w);
        beta_prev = beta;
    }
    Ok(cf)
}
