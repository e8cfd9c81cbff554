//! Implicitly restarted Lanczos (ARPACK-style)
//!
//! The solver is a reverse-communication state machine: it hands out the
//! vector it wants multiplied, the caller applies the operator and supplies
//! the product, and the loop ends when [`IrlSolver::request`] returns `None`.
//! A factorization of `ncv` Lanczos vectors is compressed to `k` vectors with
//! exact shifts (the unwanted Ritz values) and extended again until `nev`
//! Ritz pairs meet the ARPACK residual criterion.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fock::{IrlConfig, IrlSolver};
//!
//! let mut solver = IrlSolver::new(h.row_partition().clone(), h.comm(), &config, None)?;
//! while let Some(x) = solver.request() {
//!     let y = h.apply(x)?;
//!     solver.supply(y)?;
//! }
//! let result = solver.finish()?;
//! ```
//!
//! [`eigsh`] runs exactly this loop for any [`SectorOperator`].
//!
//! [`SectorOperator`]: crate::hamiltonian_impl::SectorOperator

mod irl;
mod shifts;

pub use irl::{eigsh, Info, IrlConfig, IrlResult, IrlSolver};
pub use shifts::shifted_qr;
