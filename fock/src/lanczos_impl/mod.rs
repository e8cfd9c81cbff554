//! Lanczos eigensolver and continued-fraction recursion
//!
//! The eigensolver keeps the Krylov basis so that Ritz vectors can be
//! assembled at the end, and re-orthogonalizes against it periodically. The
//! recursion only keeps the last two vectors: its tridiagonal coefficients
//! parameterize the continued fraction of a Green's function element.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fock::{lanczos, continued_fraction, LanczosConfig};
//!
//! let result = lanczos(&h, &LanczosConfig::default(), None)?;
//! let e0 = result.eigenpairs[0].value;
//!
//! let excited = t.apply(&result.eigenpairs[0].vector)?;
//! let cf = continued_fraction(&h_n, &excited, 200)?;
//! let a = cf.spectral_function(2.0, e0, 0.1);
//! ```

mod lanczos;
mod recursion;
mod tests;
mod tridiag;

pub use lanczos::{lanczos, LanczosConfig, LanczosResult, LanczosState};
pub use recursion::{continued_fraction, ContinuedFraction};
pub use tridiag::Tridiagonal;
