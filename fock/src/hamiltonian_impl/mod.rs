//! Partitioned matrix-vector products
//!
//! [`SectorOperator`] is the seam between the operator layer and the
//! solvers: a linear map between two partitioned bases that can be applied to
//! a local vector slice and densified row by row. [`Hamiltonian`] implements
//! it on top of the coupling kernel; [`DenseOperator`] wraps an explicit
//! matrix for small checks.

mod dense_operator;
mod hamiltonian;
mod tests;

pub use dense_operator::DenseOperator;
pub use hamiltonian::{Hamiltonian, Storage};

extern crate nalgebra as na;

use crate::comm::Communicator;
use crate::error::Result;
use crate::partition::Partition;
use crate::vector::StateVector;
use crate::C64;
use na::DMatrix;
use std::ops::Range;

/// Linear operator between two distributed bases.
pub trait SectorOperator {
    fn comm(&self) -> &dyn Communicator;

    /// Layout of the output vectors.
    fn row_partition(&self) -> &Partition;

    /// Layout of the input vectors.
    fn column_partition(&self) -> &Partition;

    /// Local slice of `A x` for the local slice `x`. Collective.
    fn apply(&self, x: &StateVector) -> Result<StateVector>;

    /// Local rows of the matrix, all columns. Collective.
    fn local_dense_rows(&self) -> Result<DMatrix<C64>>;

    /// Global output dimension.
    fn dim(&self) -> usize {
        self.row_partition().dim()
    }

    fn local_dim(&self) -> usize {
        self.row_partition().len(self.comm().rank())
    }

    fn local_range(&self) -> Range<usize> {
        self.row_partition().range(self.comm().rank())
    }

    fn is_square(&self) -> bool {
        self.row_partition() == self.column_partition()
    }
}
