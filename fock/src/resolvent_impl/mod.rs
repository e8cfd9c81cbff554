//! Resolvent solver
//!
//! Solves `(z - H) x = b` for Hermitian `H` and complex `z = E0 + ω + iη`
//! with a shifted MINRES iteration: Lanczos on `H` (the Krylov space does not
//! depend on the shift) and a QR factorization of the shifted tridiagonal
//! with complex Givens rotations. Memory stays at a handful of vectors and
//! `z - H` is never formed.

mod minres;

pub use minres::{solve, solve_at, ResolventConfig, ResolventResult};
