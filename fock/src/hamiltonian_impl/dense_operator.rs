//! Explicit matrices behind the operator interface.

extern crate nalgebra as na;

use super::SectorOperator;
use crate::comm::{all_gather_c64, Communicator};
use crate::error::{Error, Result};
use crate::partition::Partition;
use crate::vector::StateVector;
use crate::C64;
use na::DMatrix;

/// A matrix known in full on every rank, applied row-partitioned.
pub struct DenseOperator<'a> {
    matrix: DMatrix<C64>,
    comm: &'a dyn Communicator,
    rows: Partition,
    columns: Partition,
}

impl<'a> DenseOperator<'a> {
    pub fn new(matrix: DMatrix<C64>, comm: &'a dyn Communicator) -> Result<Self> {
        let rows = Partition::even(matrix.nrows(), comm.size());
        let columns = Partition::even(matrix.ncols(), comm.size());
        rows.check(comm)?;
        Ok(DenseOperator {
            matrix,
            comm,
            rows,
            columns,
        })
    }

    /// Real symmetric matrix given row by row.
    pub fn from_real(n: usize, values: &[f64], comm: &'a dyn Communicator) -> Result<Self> {
        if values.len() != n * n {
            return Err(Error::DimensionMismatch {
                context: "dense operator entries",
                expected: n * n,
                found: values.len(),
            });
        }
        let matrix = DMatrix::from_row_iterator(n, n, values.iter().map(|&v| C64::new(v, 0.0)));
        Self::new(matrix, comm)
    }

    pub fn matrix(&self) -> &DMatrix<C64> {
        &self.matrix
    }
}

impl SectorOperator for DenseOperator<'_> {
    fn comm(&self) -> &dyn Communicator {
        self.comm
    }

    fn row_partition(&self) -> &Partition {
        &self.rows
    }

    fn column_partition(&self) -> &Partition {
        &self.columns
    }

    fn apply(&self, x: &StateVector) -> Result<StateVector> {
        let expected = self.columns.len(self.comm.rank());
        if x.len() != expected {
            return Err(Error::DimensionMismatch {
                context: "operator input",
                expected,
                found: x.len(),
            });
        }
        let global = StateVector::from_vec(all_gather_c64(
            self.comm,
            x.as_slice(),
            &self.columns.counts(),
        ));
        let range = self.rows.range(self.comm.rank());
        Ok(self.matrix.rows(range.start, range.len()) * global)
    }

    fn local_dense_rows(&self) -> Result<DMatrix<C64>> {
        let range = self.rows.range(self.comm.rank());
        Ok(self.matrix.rows(range.start, range.len()).into_owned())
    }
}
