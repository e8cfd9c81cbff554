//! Error taxonomy shared by every solver in the crate.

use thiserror::Error;

/// Failure conditions raised by the basis, operator and Krylov layers.
///
/// Slow convergence is not an error by itself: solvers return a status with
/// a partial result and only turn it into [`Error::NonConvergence`] when the
/// caller asks for a converged answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed sector constraints or a sector without any Fock state.
    #[error("invalid sector: {0}")]
    InvalidSector(String),

    /// An operator term couples a basis state to a pattern outside the
    /// target basis.
    #[error("operator term {term} couples to Fock state {state:#b}, which is not in the basis")]
    BasisLookupFailure { state: u64, term: usize },

    /// A Krylov vector norm collapsed before the requested result existed.
    #[error("Krylov breakdown at iteration {iteration} (vector norm {norm:.3e})")]
    KrylovBreakdown { iteration: usize, norm: f64 },

    /// Iteration cap reached without meeting the tolerance.
    #[error("no convergence after {iterations} iterations (residual {residual:.3e})")]
    NonConvergence { iterations: usize, residual: f64 },

    /// Vector or partition sizes disagree.
    #[error("dimension mismatch in {context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// Dense diagonalization requested above the configured limit.
    #[error("dense diagonalization is limited to dimension {limit}, sector has dimension {dim}")]
    DenseLimitExceeded { dim: usize, limit: usize },

    /// Solver parameters that cannot describe a valid run.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
