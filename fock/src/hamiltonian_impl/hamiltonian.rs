//! Operator sums bound to a pair of bases and a process group.

extern crate nalgebra as na;

use super::SectorOperator;
use crate::basis_impl::FockBasis;
use crate::comm::{all_gather_c64, Communicator};
use crate::error::{Error, Result};
use crate::operator_impl::{CouplingKernel, CouplingRow, LookupPolicy, OperatorSum};
use crate::partition::Partition;
use crate::vector::{dotc, StateVector};
use crate::C64;
use na::DMatrix;
use rayon::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Where matrix elements live between products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Storage {
    /// Regenerate every row on each product.
    #[default]
    OnTheFly,
    /// Keep the local rows as sorted `(column, value)` lists.
    Cached,
}

/// `Σ_t a_t O_t` as a map from the right (input) basis to the left (output)
/// basis, rows distributed over the ranks of `comm`.
///
/// Products all-gather the input and then fill the local rows in parallel,
/// so remote couplings need no further communication.
pub struct Hamiltonian<'a> {
    kernel: CouplingKernel,
    comm: &'a dyn Communicator,
    rows: Partition,
    columns: Partition,
    cache: Option<Vec<CouplingRow>>,
}

impl<'a> Hamiltonian<'a> {
    /// Sector-conserving operator on `basis`; any coupling outside the basis
    /// is an error.
    pub fn new(terms: &OperatorSum, basis: Arc<FockBasis>, comm: &'a dyn Communicator) -> Result<Self> {
        Self::build(terms, basis.clone(), basis, LookupPolicy::Strict, comm)
    }

    /// Transition operator from `right` to `left`; couplings leaving `left`
    /// are projected out.
    pub fn transition(
        terms: &OperatorSum,
        left: Arc<FockBasis>,
        right: Arc<FockBasis>,
        comm: &'a dyn Communicator,
    ) -> Result<Self> {
        Self::build(terms, left, right, LookupPolicy::Project, comm)
    }

    pub fn build(
        terms: &OperatorSum,
        left: Arc<FockBasis>,
        right: Arc<FockBasis>,
        policy: LookupPolicy,
        comm: &'a dyn Communicator,
    ) -> Result<Self> {
        let rows = left.partition(comm.size());
        let columns = right.partition(comm.size());
        rows.check(comm)?;
        columns.check(comm)?;
        let kernel = CouplingKernel::new(terms, left, right, policy)?;

        let hamiltonian = Hamiltonian {
            kernel,
            comm,
            rows,
            columns,
            cache: None,
        };
        if policy == LookupPolicy::Strict {
            let kernel = &hamiltonian.kernel;
            let local = hamiltonian
                .local_rows()
                .into_par_iter()
                .try_for_each(|row| kernel.check_row(row));
            hamiltonian.agree(local)?;
        }
        if comm.is_root() {
            debug!(
                "Operator with {} terms: {} x {} ({} ranks, {:?})",
                terms.len(),
                hamiltonian.rows.dim(),
                hamiltonian.columns.dim(),
                comm.size(),
                policy
            );
        }
        Ok(hamiltonian)
    }

    /// Switch the storage mode, generating the row cache when requested.
    pub fn with_storage(mut self, storage: Storage) -> Result<Self> {
        self.cache = match storage {
            Storage::OnTheFly => None,
            Storage::Cached => {
                let kernel = &self.kernel;
                let rows = self
                    .local_rows()
                    .into_par_iter()
                    .map(|row| kernel.row(row))
                    .collect::<Result<Vec<_>>>();
                self.agree(rows.as_ref().map(|_| ()).map_err(Clone::clone))?;
                let rows = rows?;
                if self.comm.is_root() {
                    let stored: usize = rows.iter().map(|r| r.len()).sum();
                    debug!("Cached {} matrix elements on rank 0", stored);
                }
                Some(rows)
            }
        };
        Ok(self)
    }

    pub fn storage(&self) -> Storage {
        if self.cache.is_some() {
            Storage::Cached
        } else {
            Storage::OnTheFly
        }
    }

    pub fn left_basis(&self) -> &Arc<FockBasis> {
        self.kernel.left()
    }

    pub fn right_basis(&self) -> &Arc<FockBasis> {
        self.kernel.right()
    }

    /// ⟨v|H|v⟩ for a square operator. Collective.
    pub fn expectation(&self, v: &StateVector) -> Result<C64> {
        if !self.is_square() {
            return Err(Error::InvalidArgument(
                "expectation value of a non-square operator".to_string(),
            ));
        }
        let hv = self.apply(v)?;
        Ok(dotc(self.comm, v, &hv))
    }

    fn local_rows(&self) -> std::ops::Range<usize> {
        self.rows.range(self.comm.rank())
    }

    /// Turn a per-rank lookup outcome into the same result on every rank:
    /// the failure reported by the lowest failing rank.
    fn agree(&self, local: Result<()>) -> Result<()> {
        let (term, state) = match local {
            Ok(()) => (0, 0),
            Err(Error::BasisLookupFailure { state, term }) => (term + 1, state),
            Err(err) => return Err(err),
        };
        let terms = self.comm.all_gather_count(term);
        let states = self.comm.all_gather_count(state as usize);
        match terms.iter().position(|&t| t != 0) {
            Some(rank) => Err(Error::BasisLookupFailure {
                state: states[rank] as u64,
                term: terms[rank] - 1,
            }),
            None => Ok(()),
        }
    }
}

impl SectorOperator for Hamiltonian<'_> {
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
        let global = all_gather_c64(self.comm, x.as_slice(), &self.columns.counts());

        let values: Vec<C64> = match &self.cache {
            Some(rows) => rows
                .par_iter()
                .map(|row| row.iter().map(|&(column, value)| value * global[column]).sum::<C64>())
                .collect(),
            None => {
                let kernel = &self.kernel;
                self.local_rows()
                    .into_par_iter()
                    .map(|row| kernel.row_dot(row, &global))
                    .collect::<Result<Vec<_>>>()?
            }
        };
        Ok(StateVector::from_vec(values))
    }

    fn local_dense_rows(&self) -> Result<DMatrix<C64>> {
        let range = self.local_rows();
        let mut dense = DMatrix::zeros(range.len(), self.columns.dim());
        let rows = match &self.cache {
            Some(rows) => rows.clone(),
            None => {
                let kernel = &self.kernel;
                range
                    .clone()
                    .into_par_iter()
                    .map(|row| kernel.row(row))
                    .collect::<Result<Vec<_>>>()?
            }
        };
        for (i, row) in rows.iter().enumerate() {
            for &(column, value) in row {
                dense[(i, column)] = value;
            }
        }
        Ok(dense)
    }
}
