//! Distributed state vectors.
//!
//! A state vector is stored as the local slice of a rank; the helpers here
//! combine the local arithmetic with the global reductions so that every rank
//! returns the same scalar.

extern crate nalgebra as na;

use crate::comm::{all_gather_c64, all_reduce_c64, Communicator};
use crate::partition::Partition;
use crate::C64;
use na::DVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Local slice of a distributed complex vector.
pub type StateVector = DVector<C64>;

/// Global inner product ⟨a|b⟩, conjugating `a`.
pub fn dotc(comm: &dyn Communicator, a: &StateVector, b: &StateVector) -> C64 {
    let mut value = [a.dotc(b)];
    all_reduce_c64(comm, &mut value);
    value[0]
}

/// Global 2-norm.
pub fn norm(comm: &dyn Communicator, v: &StateVector) -> f64 {
    let mut value = [v.norm_squared()];
    comm.all_reduce_sum(&mut value);
    value[0].sqrt()
}

/// Multiply every element by `factor`.
pub fn scale(v: &mut StateVector, factor: C64) {
    for x in v.iter_mut() {
        *x *= factor;
    }
}

/// Normalize in place and return the norm before normalization.
///
/// A zero vector is left untouched.
pub fn normalize(comm: &dyn Communicator, v: &mut StateVector) -> f64 {
    let n = norm(comm, v);
    if n > 0.0 {
        scale(v, C64::new(1.0 / n, 0.0));
    }
    n
}

/// Remove the components of `v` along the orthonormal vectors `basis`
/// (classical Gram-Schmidt, one reduction for all coefficients) and return
/// the removed coefficients.
pub fn project_out(comm: &dyn Communicator, v: &mut StateVector, basis: &[StateVector]) -> Vec<C64> {
    let mut coeffs: Vec<C64> = basis.iter().map(|q| q.dotc(v)).collect();
    all_reduce_c64(comm, &mut coeffs);
    for (q, &c) in basis.iter().zip(&coeffs) {
        v.axpy(-c, q, C64::new(1.0, 0.0));
    }
    coeffs
}

/// Local slice of a seeded random vector with components uniform in the unit
/// square of the complex plane.
///
/// The sequence is drawn over the global index, so the assembled vector is
/// the same for any number of ranks.
pub fn random_state(partition: &Partition, rank: usize, seed: u64) -> StateVector {
    let mut rng = StdRng::seed_from_u64(seed);
    let range = partition.range(rank);
    let mut local = StateVector::zeros(range.len());
    for global in 0..range.end {
        let z = C64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        if global >= range.start {
            local[global - range.start] = z;
        }
    }
    local
}

/// Assemble the full vector on every rank.
pub fn gather(comm: &dyn Communicator, partition: &Partition, local: &StateVector) -> DVector<C64> {
    DVector::from_vec(all_gather_c64(comm, local.as_slice(), &partition.counts()))
}

/// Cut the local slice of `rank` out of a global vector.
pub fn scatter(partition: &Partition, rank: usize, global: &DVector<C64>) -> StateVector {
    let range = partition.range(rank);
    global.rows(range.start, range.len()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{run_ranks, SelfComm};

    #[test]
    fn test_random_state_independent_of_rank_count() {
        let serial = random_state(&Partition::even(11, 1), 0, 42);
        let slices = run_ranks(3, |comm| {
            let p = Partition::even(11, comm.size());
            gather(comm, &p, &random_state(&p, comm.rank(), 42))
        });
        for global in slices {
            assert_eq!(global, serial);
        }
    }

    #[test]
    fn test_scatter_then_gather_restores_global_vector() {
        let global = DVector::from_iterator(7, (0..7).map(|i| C64::new(i as f64, -(i as f64))));
        let gathered = run_ranks(3, |comm| {
            let p = Partition::even(7, comm.size());
            let local = scatter(&p, comm.rank(), &global);
            assert_eq!(local.len(), p.len(comm.rank()));
            gather(comm, &p, &local)
        });
        for g in gathered {
            assert_eq!(g, global);
        }
    }

    #[test]
    fn test_project_out_leaves_orthogonal_remainder() {
        let comm = SelfComm;
        let p = Partition::even(6, 1);
        let mut q = random_state(&p, 0, 1);
        normalize(&comm, &mut q);
        let mut v = random_state(&p, 0, 2);
        project_out(&comm, &mut v, std::slice::from_ref(&q));
        assert!(dotc(&comm, &q, &v).norm() < 1e-14);
    }

    #[test]
    fn test_distributed_norm_matches_serial() {
        let serial = norm(&SelfComm, &random_state(&Partition::even(9, 1), 0, 5));
        let norms = run_ranks(4, |comm| {
            let p = Partition::even(9, comm.size());
            norm(comm, &random_state(&p, comm.rank(), 5))
        });
        for n in norms {
            assert!((n - serial).abs() < 1e-12);
        }
    }
}
