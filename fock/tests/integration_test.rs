//! End-to-end checks of the solvers on small physical models
//!
//! Each test builds a Hamiltonian from ladder-operator terms and compares
//! the iterative solvers with the dense reference, serially and on a
//! threaded rank group.

use fock::{
    binomial, diagonalize, eigsh, four_fermion_terms, lanczos, number_operator, run_ranks,
    sz_predicate, two_fermion_terms, Communicator, DenseConfig, DenseOperator, FockBasis,
    Hamiltonian, IrlConfig, LanczosConfig, OperatorSum, OperatorTerm, SectorOperator, SelfComm,
    Sector, Which, C64,
};
use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Two-site Hubbard model; orbital `2 * site + spin`.
    fn hubbard_dimer(t: f64, u: f64) -> OperatorSum {
        let mut terms = OperatorSum::new();
        for spin in 0..2 {
            let (a, b) = (spin, 2 + spin);
            terms.push(OperatorTerm::hopping(a, b, C64::new(-t, 0.0)));
            terms.push(OperatorTerm::hopping(b, a, C64::new(-t, 0.0)));
        }
        for site in 0..2 {
            let (up, dn) = (2 * site, 2 * site + 1);
            // n_up n_dn = c†_up c†_dn c_dn c_up
            terms.push(OperatorTerm::coulomb(up, dn, dn, up, C64::new(u, 0.0)));
        }
        terms
    }

    fn random_model(n: usize, seed: u64) -> OperatorSum {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut hop = DMatrix::<C64>::zeros(n, n);
        for i in 0..n {
            hop[(i, i)] = C64::new(rng.gen_range(-1.0..1.0), 0.0);
            for j in 0..i {
                let z = C64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
                hop[(i, j)] = z;
                hop[(j, i)] = z.conj();
            }
        }
        // density-density repulsion, Hermitian by construction
        let v: Vec<f64> = (0..n * n).map(|_| rng.gen_range(0.0..0.5)).collect();
        let mut terms = two_fermion_terms(&hop, 0.0);
        terms.extend(four_fermion_terms(
            n,
            |i, j, k, l| {
                if i == l && j == k {
                    C64::new(v[i * n + j] + v[j * n + i], 0.0)
                } else {
                    C64::new(0.0, 0.0)
                }
            },
            1e-14,
        ));
        terms
    }

    #[test]
    fn test_hubbard_dimer_ground_state() {
        let comm = SelfComm;
        let (t, u) = (1.0_f64, 4.0_f64);
        let exact = u / 2.0 - (u * u / 4.0 + 4.0 * t * t).sqrt();
        let sector = Sector::fixed(4, 2).with_predicate(sz_predicate(0));
        let basis = Arc::new(FockBasis::new(&sector).unwrap());
        assert_eq!(basis.dim(), 4);
        let h = Hamiltonian::new(&hubbard_dimer(t, u), basis, &comm).unwrap();

        let dense = diagonalize(&h, &DenseConfig::default()).unwrap();
        assert!((dense[0].value - exact).abs() < 1e-12);

        let krylov = lanczos(&h, &LanczosConfig::default(), None)
            .unwrap()
            .into_converged()
            .unwrap();
        assert!((krylov.eigenpairs[0].value - exact).abs() < 1e-10);

        let config = IrlConfig {
            nev: 1,
            ncv: Some(3),
            ..IrlConfig::default()
        };
        let irl = eigsh(&h, &config, None).unwrap().into_converged().unwrap();
        assert!((irl.eigenpairs[0].value - exact).abs() < 1e-10);
    }

    #[test]
    fn test_number_operator_in_fixed_sector() {
        let comm = SelfComm;
        let basis = Arc::new(FockBasis::new(&Sector::fixed(8, 3)).unwrap());
        assert_eq!(basis.dim() as u64, binomial(8, 3));
        let h = Hamiltonian::new(&random_model(8, 3), basis.clone(), &comm).unwrap();
        let config = DenseConfig {
            n_eigen: Some(2),
            ..DenseConfig::default()
        };
        let ground = diagonalize(&h, &config).unwrap();
        let n_op = Hamiltonian::new(&number_operator(8), basis, &comm).unwrap();
        for pair in &ground {
            let n = n_op.expectation(&pair.vector).unwrap();
            assert!((n.re - 3.0).abs() < 1e-10);
            assert!(n.im.abs() < 1e-10);
        }
    }

    #[test]
    fn test_spectrum_independent_of_rank_count() {
        let terms = random_model(8, 11);
        let sector = Sector::fixed(8, 4);
        let config = LanczosConfig {
            n_eigen: 3,
            ..LanczosConfig::default()
        };
        let solve = |comm: &dyn Communicator| -> Vec<f64> {
            let basis = Arc::new(FockBasis::new(&sector).unwrap());
            let h = Hamiltonian::new(&terms, basis, comm).unwrap();
            lanczos(&h, &config, None)
                .unwrap()
                .into_converged()
                .unwrap()
                .eigenpairs
                .iter()
                .map(|p| p.value)
                .collect()
        };
        let serial = solve(&SelfComm);
        for ranks in [2, 3, 4] {
            for values in run_ranks(ranks, |comm| solve(comm)) {
                for (a, b) in values.iter().zip(&serial) {
                    assert!((a - b).abs() < 1e-8, "{} ranks: {} vs {}", ranks, a, b);
                }
            }
        }
    }

    #[test]
    fn test_irl_and_dense_agree_on_50_states() {
        let comm = SelfComm;
        let n = 50;
        // 1D chain with a random on-site potential
        let mut rng = StdRng::seed_from_u64(50);
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = rng.gen_range(-2.0..2.0);
            if i + 1 < n {
                values[i * n + i + 1] = -1.0;
                values[(i + 1) * n + i] = -1.0;
            }
        }
        let h = DenseOperator::from_real(n, &values, &comm).unwrap();
        let exact = diagonalize(&h, &DenseConfig::default()).unwrap();
        for which in [Which::SmallestAlgebraic, Which::LargestAlgebraic] {
            let config = IrlConfig {
                nev: 3,
                ncv: Some(10),
                which,
                ..IrlConfig::default()
            };
            let result = eigsh(&h, &config, None).unwrap().into_converged().unwrap();
            let reference: Vec<f64> = match which {
                Which::SmallestAlgebraic => exact[..3].iter().map(|p| p.value).collect(),
                Which::LargestAlgebraic => exact[n - 3..].iter().map(|p| p.value).collect(),
            };
            let mut found: Vec<f64> = result.eigenpairs.iter().map(|p| p.value).collect();
            found.sort_by(f64::total_cmp);
            for (a, b) in found.iter().zip(&reference) {
                assert!((a - b).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn test_hamiltonian_is_hermitian_on_threads() {
        let terms = random_model(6, 5);
        let sector = Sector::any(6);
        let blocks = run_ranks(3, |comm| {
            let basis = Arc::new(FockBasis::new(&sector).unwrap());
            let h = Hamiltonian::new(&terms, basis, comm).unwrap();
            (h.local_range(), h.local_dense_rows().unwrap())
        });
        let dim = 64;
        let mut full = DMatrix::<C64>::zeros(dim, dim);
        for (range, rows) in blocks {
            full.rows_mut(range.start, range.len()).copy_from(&rows);
        }
        assert!((&full - full.adjoint()).norm() < 1e-12);
    }
}
