//! Tests for the partitioned operators

#[cfg(test)]
mod tests {
    use super::super::{DenseOperator, Hamiltonian, SectorOperator, Storage};
    use crate::basis_impl::{FockBasis, Sector};
    use crate::comm::{run_ranks, Communicator, SelfComm};
    use crate::error::Error;
    use crate::operator_impl::{number_operator, LadderOp, OperatorSum, OperatorTerm};
    use crate::testing::random_hermitian_terms;
    use crate::vector::{dotc, gather, random_state};
    use crate::C64;
    use std::sync::Arc;

    #[test]
    fn test_hermiticity() {
        let comm = SelfComm;
        let basis = Arc::new(FockBasis::new(&Sector::fixed(6, 3)).unwrap());
        let h = Hamiltonian::new(&random_hermitian_terms(6, 3), basis, &comm).unwrap();
        let p = h.row_partition().clone();
        for seed in 0..4 {
            let u = random_state(&p, 0, 100 + seed);
            let v = random_state(&p, 0, 200 + seed);
            let lhs = dotc(&comm, &u, &h.apply(&v).unwrap());
            let rhs = dotc(&comm, &h.apply(&u).unwrap(), &v);
            assert!((lhs - rhs).norm() < 1e-11, "{} vs {}", lhs, rhs);
        }
    }

    #[test]
    fn test_dense_rows_hermitian() {
        let comm = SelfComm;
        let basis = Arc::new(FockBasis::new(&Sector::fixed(5, 2)).unwrap());
        let h = Hamiltonian::new(&random_hermitian_terms(5, 9), basis, &comm).unwrap();
        let dense = h.local_dense_rows().unwrap();
        assert_eq!(dense.shape(), (10, 10));
        assert!((&dense - dense.adjoint()).norm() < 1e-12);
    }

    #[test]
    fn test_distributed_apply_matches_serial() {
        let terms = random_hermitian_terms(6, 11);
        let basis = Arc::new(FockBasis::new(&Sector::fixed(6, 2)).unwrap());
        let serial = {
            let h = Hamiltonian::new(&terms, basis.clone(), &SelfComm).unwrap();
            let x = random_state(h.row_partition(), 0, 5);
            h.apply(&x).unwrap()
        };
        for n_ranks in [2, 3, 4] {
            let results = run_ranks(n_ranks, |comm| {
                let h = Hamiltonian::new(&terms, basis.clone(), comm).unwrap();
                let x = random_state(h.row_partition(), comm.rank(), 5);
                gather(comm, h.row_partition(), &h.apply(&x).unwrap())
            });
            for global in results {
                assert!((&global - &serial).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_cached_storage_matches_on_the_fly() {
        let comm = SelfComm;
        let terms = random_hermitian_terms(5, 2);
        let basis = Arc::new(FockBasis::new(&Sector::fixed(5, 3)).unwrap());
        let fly = Hamiltonian::new(&terms, basis.clone(), &comm).unwrap();
        let cached = Hamiltonian::new(&terms, basis, &comm)
            .unwrap()
            .with_storage(Storage::Cached)
            .unwrap();
        assert_eq!(cached.storage(), Storage::Cached);
        let x = random_state(fly.row_partition(), 0, 8);
        assert!((fly.apply(&x).unwrap() - cached.apply(&x).unwrap()).norm() < 1e-13);
    }

    #[test]
    fn test_lookup_failure_reported_on_every_rank() {
        let basis = Arc::new(FockBasis::new(&Sector::fixed(4, 2)).unwrap());
        let pairing = OperatorSum::from_terms(vec![OperatorTerm::new(
            vec![LadderOp::Create(0), LadderOp::Create(1)],
            C64::new(1.0, 0.0),
        )]);
        let results = run_ranks(3, |comm| {
            Hamiltonian::new(&pairing, basis.clone(), comm).map(|_| ())
        });
        let first = results[0].clone();
        assert!(matches!(first, Err(Error::BasisLookupFailure { term: 0, .. })));
        assert!(results.iter().all(|r| *r == first));
    }

    #[test]
    fn test_expectation_of_particle_number() {
        let comm = SelfComm;
        let basis = Arc::new(FockBasis::new(&Sector::fixed(6, 4)).unwrap());
        let n = Hamiltonian::new(&number_operator(6), basis, &comm).unwrap();
        let mut v = random_state(n.row_partition(), 0, 1);
        crate::vector::normalize(&comm, &mut v);
        assert!((n.expectation(&v).unwrap() - C64::new(4.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_transition_operator_shapes() {
        let comm = SelfComm;
        let ground = Arc::new(FockBasis::new(&Sector::fixed(4, 1)).unwrap());
        let excited = Arc::new(FockBasis::new(&Sector::fixed(4, 2)).unwrap());
        let dipole = OperatorSum::from_terms(vec![OperatorTerm::new(
            vec![LadderOp::Create(3)],
            C64::new(1.0, 0.0),
        )]);
        let t = Hamiltonian::transition(&dipole, excited, ground, &comm).unwrap();
        assert_eq!(t.dim(), 6);
        assert_eq!(t.column_partition().dim(), 4);
        assert!(!t.is_square());
        assert!(matches!(
            t.expectation(&random_state(t.column_partition(), 0, 0)),
            Err(Error::InvalidArgument(_))
        ));
        let wrong = random_state(t.row_partition(), 0, 0);
        assert!(matches!(t.apply(&wrong), Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_dense_operator_apply() {
        let results = run_ranks(2, |comm| {
            let op = DenseOperator::from_real(3, &[1.0, 2.0, 0.0, 2.0, 3.0, 1.0, 0.0, 1.0, 5.0], comm)
                .unwrap();
            let p = op.column_partition().clone();
            let range = p.range(comm.rank());
            let x = crate::vector::StateVector::from_iterator(
                range.len(),
                range.map(|i| C64::new(i as f64 + 1.0, 0.0)),
            );
            gather(comm, op.row_partition(), &op.apply(&x).unwrap())
        });
        for y in results {
            let expected = [5.0, 11.0, 17.0];
            for (a, b) in y.iter().zip(expected) {
                assert!((a.re - b).abs() < 1e-14);
            }
        }
    }
}
