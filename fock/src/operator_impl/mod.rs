//! Second-quantized operators and their action on Fock states
//!
//! An operator is a sum of terms, each term an amplitude times a string of
//! creation and annihilation operators. Matrix elements are produced row by
//! row: the adjoint string is applied to the row state, which yields the
//! coupled column state and the fermionic sign without ever storing the
//! matrix.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fock::{two_fermion_terms, four_fermion_terms, OperatorSum};
//!
//! let mut h = two_fermion_terms(&hopping, 1e-10);
//! h.extend(four_fermion_terms(n_orbitals, |i, j, k, l| umat[(i, j, k, l)], 1e-10));
//! ```

mod apply;
mod term;

pub use apply::{apply_string, CouplingKernel, CouplingRow, LookupPolicy};
pub use term::{
    four_fermion_terms, number_operator, two_fermion_terms, LadderOp, OperatorSum, OperatorTerm,
};
