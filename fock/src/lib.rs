// Sparse exact diagonalization in a Fock basis

pub mod comm;
pub mod eigen;
pub mod error;
pub mod partition;
pub mod vector;

pub mod arpack_impl;
pub mod basis_impl;
pub mod dense_impl;
pub mod hamiltonian_impl;
pub mod lanczos_impl;
pub mod operator_impl;
pub mod resolvent_impl;
pub mod spectra_impl;

#[cfg(test)]
mod testing;

/// Complex amplitude type used throughout.
pub type C64 = num_complex::Complex64;

pub use arpack_impl::{eigsh, Info, IrlConfig, IrlResult, IrlSolver};
pub use basis_impl::{binomial, sz_predicate, FockBasis, FockState, Occupation, Sector};
pub use comm::{run_ranks, Communicator, SelfComm, ThreadComm};
pub use dense_impl::{diagonalize, DenseConfig};
pub use eigen::{Eigenpair, Which};
pub use error::{Error, Result};
pub use hamiltonian_impl::{DenseOperator, Hamiltonian, SectorOperator, Storage};
pub use lanczos_impl::{
    continued_fraction, lanczos, ContinuedFraction, LanczosConfig, LanczosResult, LanczosState,
};
pub use operator_impl::{
    four_fermion_terms, number_operator, two_fermion_terms, LadderOp, LookupPolicy, OperatorSum,
    OperatorTerm,
};
pub use partition::Partition;
pub use resolvent_impl::{solve, ResolventConfig, ResolventResult};
pub use spectra_impl::{
    boltzmann_weights, linspace, rixs, xas, RixsConfig, RixsMap, XasConfig, XasSpectrum,
};
pub use vector::StateVector;
