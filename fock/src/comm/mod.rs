//! Process-group abstraction.
//!
//! Every solve runs on a fixed group of ranks. Each rank owns a contiguous
//! slice of every state vector, and all inner products go through a global
//! reduction before any rank moves on to the next iteration. Three backends
//! are provided:
//!
//! - [`SelfComm`]: a single process, collectives are no-ops.
//! - [`ThreadComm`]: ranks are threads of one process exchanging data through
//!   shared slots, used for tests and for `--ranks N` runs of the driver.
//! - `MpiComm` (feature `mpi`): one rank per MPI process.
//!
//! Reductions sum the contributions in rank order, so every rank observes the
//! bit-identical result.

mod threads;
#[cfg(feature = "mpi")]
mod mpi;

pub use threads::{run_ranks, ThreadComm};
#[cfg(feature = "mpi")]
pub use self::mpi::MpiComm;

use num_complex::Complex64 as C64;

/// Collective operations needed by the Krylov solvers.
pub trait Communicator {
    /// Rank of the calling process in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Element-wise sum of `buf` over all ranks; every rank receives the sum.
    fn all_reduce_sum(&self, buf: &mut [f64]);

    /// Concatenation of every rank's `local` slice in rank order.
    ///
    /// `counts[r]` is the number of values contributed by rank `r`.
    fn all_gather_varcount(&self, local: &[f64], counts: &[usize]) -> Vec<f64>;

    /// One value per rank, gathered on every rank.
    fn all_gather_count(&self, value: usize) -> Vec<usize>;

    fn is_root(&self) -> bool {
        self.rank() == 0
    }
}

/// The trivial single-process group.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfComm;

impl Communicator for SelfComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce_sum(&self, _buf: &mut [f64]) {}

    fn all_gather_varcount(&self, local: &[f64], _counts: &[usize]) -> Vec<f64> {
        local.to_vec()
    }

    fn all_gather_count(&self, value: usize) -> Vec<usize> {
        vec![value]
    }
}

/// Sum complex values over all ranks.
pub fn all_reduce_c64(comm: &dyn Communicator, values: &mut [C64]) {
    if comm.size() == 1 {
        return;
    }
    let mut flat: Vec<f64> = values.iter().flat_map(|z| [z.re, z.im]).collect();
    comm.all_reduce_sum(&mut flat);
    for (z, pair) in values.iter_mut().zip(flat.chunks_exact(2)) {
        *z = C64::new(pair[0], pair[1]);
    }
}

/// Gather the complex slices of all ranks into one global array.
pub fn all_gather_c64(comm: &dyn Communicator, local: &[C64], counts: &[usize]) -> Vec<C64> {
    if comm.size() == 1 {
        return local.to_vec();
    }
    let flat: Vec<f64> = local.iter().flat_map(|z| [z.re, z.im]).collect();
    let doubled: Vec<usize> = counts.iter().map(|&c| 2 * c).collect();
    comm.all_gather_varcount(&flat, &doubled)
        .chunks_exact(2)
        .map(|pair| C64::new(pair[0], pair[1]))
        .collect()
}
