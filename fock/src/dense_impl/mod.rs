//! Full diagonalization of small sectors
//!
//! The operator is densified (local rows, then an all-gather) and handed to
//! nalgebra's Hermitian eigensolver. Every rank decomposes the same matrix and
//! keeps its own slice of each eigenvector. This is the reference the Krylov
//! solvers are checked against.

mod dense;

pub use dense::{diagonalize, dense_matrix, DenseConfig};
