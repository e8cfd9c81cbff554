//! MPI backend, one rank per process.

use super::Communicator;
use mpi::collective::SystemOperation;
use mpi::datatype::PartitionMut;
use mpi::topology::SimpleCommunicator;
use mpi::traits::Communicator as _;
use mpi::traits::*;

/// Wraps an MPI communicator (usually the world).
pub struct MpiComm {
    world: SimpleCommunicator,
}

impl MpiComm {
    pub fn new(world: SimpleCommunicator) -> Self {
        MpiComm { world }
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn all_reduce_sum(&self, buf: &mut [f64]) {
        let local = buf.to_vec();
        self.world
            .all_reduce_into(&local[..], buf, SystemOperation::sum());
    }

    fn all_gather_varcount(&self, local: &[f64], counts: &[usize]) -> Vec<f64> {
        let counts: Vec<i32> = counts.iter().map(|&c| c as i32).collect();
        let mut displacements = vec![0i32; counts.len()];
        for i in 1..counts.len() {
            displacements[i] = displacements[i - 1] + counts[i - 1];
        }
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        let mut out = vec![0.0f64; total];
        {
            let mut partition = PartitionMut::new(&mut out[..], counts, displacements);
            self.world.all_gather_varcount_into(local, &mut partition);
        }
        out
    }

    fn all_gather_count(&self, value: usize) -> Vec<usize> {
        let send = value as u64;
        let mut recv = vec![0u64; self.size()];
        self.world.all_gather_into(&send, &mut recv[..]);
        recv.into_iter().map(|v| v as usize).collect()
    }
}
