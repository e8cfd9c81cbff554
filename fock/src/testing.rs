//! Random Hermitian models shared by the unit tests.

use crate::operator_impl::{four_fermion_terms, two_fermion_terms, OperatorSum};
use crate::C64;
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random Hermitian `n x n` matrix.
pub fn random_hermitian_matrix(n: usize, seed: u64) -> DMatrix<C64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut h = DMatrix::<C64>::zeros(n, n);
    for i in 0..n {
        h[(i, i)] = C64::new(rng.gen_range(-1.0..1.0), 0.0);
        for j in 0..i {
            let z = C64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
            h[(i, j)] = z;
            h[(j, i)] = z.conj();
        }
    }
    h
}

/// Hermitian hopping plus a Hermitian-symmetrized two-body interaction on
/// `n` orbitals.
pub fn random_hermitian_terms(n: usize, seed: u64) -> OperatorSum {
    let hop = random_hermitian_matrix(n, seed);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(0x5eed));
    let u: Vec<C64> = (0..n * n * n * n)
        .map(|_| C64::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5)))
        .collect();
    let coulomb = four_fermion_terms(n, |i, j, k, l| u[((i * n + j) * n + k) * n + l], 0.0);
    let mut terms = two_fermion_terms(&hop, 0.0);
    terms.extend(coulomb.adjoint());
    terms.extend(coulomb);
    terms
}
