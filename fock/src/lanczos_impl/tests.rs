//! Tests for the Lanczos engine and the continued fraction

#[cfg(test)]
mod tests {
    use super::super::{continued_fraction, lanczos, LanczosConfig, LanczosState, Tridiagonal};
    use crate::basis_impl::{FockBasis, Sector};
    use crate::comm::{run_ranks, Communicator, SelfComm};
    use crate::dense_impl::{diagonalize, DenseConfig};
    use crate::eigen::Which;
    use crate::error::Error;
    use crate::hamiltonian_impl::{DenseOperator, Hamiltonian, SectorOperator};
    use crate::testing::{random_hermitian_matrix, random_hermitian_terms};
    use crate::vector::{random_state, StateVector};
    use crate::C64;
    use nalgebra::DMatrix;
    use std::sync::Arc;

    fn two_level(comm: &dyn Communicator) -> DenseOperator<'_> {
        DenseOperator::from_real(2, &[1.0, 0.5, 0.5, -1.0], comm).unwrap()
    }

    #[test]
    fn test_two_step_krylov_is_exact() {
        let comm = SelfComm;
        let h = two_level(&comm);
        let config = LanczosConfig {
            n_eigen: 2,
            max_iter: 2,
            ..LanczosConfig::default()
        };
        let result = lanczos(&h, &config, None).unwrap();
        let expected = 1.25f64.sqrt();
        assert_eq!(result.state, LanczosState::Converged);
        assert_eq!(result.iterations, 2);
        assert!((result.eigenpairs[0].value + expected).abs() < 1e-12);
        assert!((result.eigenpairs[1].value - expected).abs() < 1e-12);
        assert!(result.eigenpairs.iter().all(|p| p.converged));
    }

    #[test]
    fn test_ground_state_matches_dense() {
        let comm = SelfComm;
        let basis = Arc::new(FockBasis::new(&Sector::fixed(8, 4)).unwrap());
        let h = Hamiltonian::new(&random_hermitian_terms(8, 21), basis, &comm).unwrap();
        let exact = diagonalize(&h, &DenseConfig::default()).unwrap();
        let config = LanczosConfig {
            n_eigen: 3,
            ..LanczosConfig::default()
        };
        let result = lanczos(&h, &config, None).unwrap().into_converged().unwrap();
        for (pair, reference) in result.eigenpairs.iter().zip(&exact) {
            assert!((pair.value - reference.value).abs() < 1e-8);
        }
        // reported residuals and flags describe the assembled Ritz vectors
        for (pair, &reported) in result.eigenpairs.iter().zip(&result.residuals) {
            let hv = h.apply(&pair.vector).unwrap();
            let residual = (&hv - &pair.vector * C64::new(pair.value, 0.0)).norm();
            assert!((residual - reported).abs() < 1e-9, "{} vs {}", residual, reported);
            assert_eq!(pair.converged, reported <= config.tol * pair.value.abs().max(1.0));
        }
    }

    #[test]
    fn test_refined_ritz_vectors_with_tiny_couplings() {
        let tri = Tridiagonal {
            alpha: vec![-1.0, 0.5, 2.0, 3.0, -0.7, 1.5, 4.0],
            beta: vec![0.3, 1e-9, 0.8, 1e-11, 0.4, 0.6],
        };
        let m = tri.len();
        let (mut values, mut vectors) = tri.eigen();
        let all: Vec<usize> = (0..m).collect();
        tri.refine(&mut values, &mut vectors, &all);
        let t = tri.to_matrix(m);
        for k in 0..m {
            let s = vectors.column(k);
            assert!((&t * &s - &s * values[k]).norm() < 1e-13);
            assert!(tri.ritz_residual(values[k], &vectors, k, 0.0) < 1e-13);
        }
        let overlap = vectors.transpose() * &vectors;
        assert!((overlap - DMatrix::<f64>::identity(m, m)).norm() < 1e-12);
    }

    #[test]
    fn test_refinement_keeps_degenerate_vectors_orthogonal() {
        // two identical decoupled blocks give doubly degenerate Ritz values
        let tri = Tridiagonal {
            alpha: vec![1.0, 2.0, 1.0, 2.0],
            beta: vec![0.5, 0.0, 0.5],
        };
        let (mut values, mut vectors) = tri.eigen();
        tri.refine(&mut values, &mut vectors, &[0, 1, 2, 3]);
        let overlap = vectors.transpose() * &vectors;
        assert!((overlap - DMatrix::<f64>::identity(4, 4)).norm() < 1e-12);
        assert!((values[0] - values[1]).abs() < 1e-13);
        for k in 0..4 {
            assert!(tri.ritz_residual(values[k], &vectors, k, 0.0) < 1e-13);
        }
        // the last-step coupling enters through the final component
        let with_tail = tri.ritz_residual(values[3], &vectors, 3, 2.0);
        assert!((with_tail - 2.0 * vectors[(3, 3)].abs()).abs() < 1e-13);
    }

    #[test]
    fn test_largest_algebraic() {
        let comm = SelfComm;
        let h = DenseOperator::new(random_hermitian_matrix(30, 4), &comm).unwrap();
        let exact = diagonalize(&h, &DenseConfig::default()).unwrap();
        let config = LanczosConfig {
            n_eigen: 2,
            which: Which::LargestAlgebraic,
            ..LanczosConfig::default()
        };
        let result = lanczos(&h, &config, None).unwrap();
        assert!((result.eigenpairs[1].value - exact[29].value).abs() < 1e-8);
        assert!((result.eigenpairs[0].value - exact[28].value).abs() < 1e-8);
    }

    #[test]
    fn test_max_iterations_is_partial_result() {
        let comm = SelfComm;
        let h = DenseOperator::new(random_hermitian_matrix(40, 5), &comm).unwrap();
        let config = LanczosConfig {
            max_iter: 4,
            ..LanczosConfig::default()
        };
        let result = lanczos(&h, &config, None).unwrap();
        assert_eq!(result.state, LanczosState::MaxIterReached);
        assert_eq!(result.iterations, 4);
        assert_eq!(result.eigenpairs.len(), 1);
        assert!(matches!(
            result.into_converged(),
            Err(Error::NonConvergence { iterations: 4, .. })
        ));
    }

    #[test]
    fn test_breakdown() {
        let comm = SelfComm;
        let h = DenseOperator::from_real(3, &[1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 3.0], &comm)
            .unwrap();
        let zero = StateVector::zeros(3);
        assert!(matches!(
            lanczos(&h, &LanczosConfig::default(), Some(&zero)),
            Err(Error::KrylovBreakdown { iteration: 0, .. })
        ));

        // an eigenvector spans an invariant subspace of dimension one
        let mut e1 = StateVector::zeros(3);
        e1[1] = C64::new(1.0, 0.0);
        let one = lanczos(&h, &LanczosConfig::default(), Some(&e1)).unwrap();
        assert_eq!(one.state, LanczosState::Converged);
        assert!((one.eigenpairs[0].value - 2.0).abs() < 1e-13);

        let two = LanczosConfig {
            n_eigen: 2,
            ..LanczosConfig::default()
        };
        assert!(matches!(
            lanczos(&h, &two, Some(&e1)),
            Err(Error::KrylovBreakdown { iteration: 1, .. })
        ));
    }

    #[test]
    fn test_distributed_run_matches_serial() {
        let terms = random_hermitian_terms(7, 8);
        let basis = Arc::new(FockBasis::new(&Sector::fixed(7, 3)).unwrap());
        let serial = {
            let h = Hamiltonian::new(&terms, basis.clone(), &SelfComm).unwrap();
            lanczos(&h, &LanczosConfig::default(), None).unwrap().eigenpairs[0].value
        };
        let energies = run_ranks(3, |comm| {
            let h = Hamiltonian::new(&terms, basis.clone(), comm).unwrap();
            lanczos(&h, &LanczosConfig::default(), None).unwrap().eigenpairs[0].value
        });
        for e in energies {
            assert!((e - serial).abs() < 1e-9);
        }
    }

    #[test]
    fn test_repeated_runs_agree() {
        let comm = SelfComm;
        let h = DenseOperator::new(random_hermitian_matrix(25, 6), &comm).unwrap();
        let a = lanczos(&h, &LanczosConfig::default(), None).unwrap();
        let b = lanczos(&h, &LanczosConfig::default(), None).unwrap();
        assert!((a.eigenpairs[0].value - b.eigenpairs[0].value).abs() < 1e-12);
    }

    #[test]
    fn test_continued_fraction_equals_resolvent_element() {
        let comm = SelfComm;
        let n = 12;
        let h = DenseOperator::new(random_hermitian_matrix(n, 13), &comm).unwrap();
        let v = random_state(h.row_partition(), 0, 3);
        let cf = continued_fraction(&h, &v, n).unwrap();
        assert!(cf.len() <= n);

        let exact = diagonalize(&h, &DenseConfig::default()).unwrap();
        for z in [C64::new(0.3, 0.05), C64::new(-2.0, 0.5), C64::new(1.1, 1e-3)] {
            let reference: C64 = exact
                .iter()
                .map(|pair| {
                    let overlap = pair.vector.dotc(&v).norm_sqr();
                    C64::new(overlap, 0.0) / (z - pair.value)
                })
                .sum();
            assert!((cf.green(z) - reference).norm() < 1e-7 * reference.norm().max(1.0));
        }
    }

    #[test]
    fn test_spectral_function_integrates_to_norm() {
        let comm = SelfComm;
        let h = DenseOperator::new(random_hermitian_matrix(8, 1), &comm).unwrap();
        let v = random_state(h.row_partition(), 0, 9);
        let cf = continued_fraction(&h, &v, 8).unwrap();
        let d_omega = 0.001;
        let integral: f64 = (0..20_000)
            .map(|i| cf.spectral_function(-10.0 + i as f64 * d_omega, 0.0, 0.05) * d_omega)
            .sum();
        assert!((integral - cf.norm2).abs() < 0.01 * cf.norm2);
    }

    #[test]
    fn test_zero_start_gives_empty_fraction() {
        let comm = SelfComm;
        let h = two_level(&comm);
        let cf = continued_fraction(&h, &StateVector::zeros(2), 10).unwrap();
        assert!(cf.is_empty());
        assert_eq!(cf.green(C64::new(0.0, 0.1)), C64::new(0.0, 0.0));
    }
}
