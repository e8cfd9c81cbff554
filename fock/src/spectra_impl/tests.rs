//! Tests for XAS and RIXS

#[cfg(test)]
mod tests {
    use super::super::{
        boltzmann_weights, linspace, rixs, xas, RixsConfig, XasConfig, BOLTZMANN_EV,
    };
    use crate::basis_impl::{FockBasis, Sector};
    use crate::comm::{run_ranks, Communicator, SelfComm};
    use crate::dense_impl::{diagonalize, DenseConfig};
    use crate::error::Error;
    use crate::hamiltonian_impl::Hamiltonian;
    use crate::operator_impl::{LadderOp, OperatorSum, OperatorTerm};
    use crate::C64;
    use std::f64::consts::PI;
    use std::sync::Arc;

    const LEVELS: [f64; 3] = [0.0, 2.0, 5.0];

    fn levels() -> OperatorSum {
        LEVELS
            .iter()
            .enumerate()
            .map(|(i, &e)| OperatorTerm::hopping(i, i, C64::new(e, 0.0)))
            .collect()
    }

    fn single(op: LadderOp) -> OperatorSum {
        OperatorSum::from_terms(vec![OperatorTerm::new(vec![op], C64::new(1.0, 0.0))])
    }

    fn sector(n_particles: usize) -> Arc<FockBasis> {
        Arc::new(FockBasis::new(&Sector::fixed(3, n_particles)).unwrap())
    }

    #[test]
    fn test_boltzmann_weights() {
        let w = boltzmann_weights(&[1.0, 1.0, 1.5], 0.0);
        assert_eq!(w, vec![0.5, 0.5, 0.0]);

        let w = boltzmann_weights(&[0.0, 0.01], 300.0);
        let ratio = (-0.01 / (BOLTZMANN_EV * 300.0)).exp();
        assert!((w[0] + w[1] - 1.0).abs() < 1e-14);
        assert!((w[1] / w[0] - ratio).abs() < 1e-12);

        let hot = boltzmann_weights(&[0.0, 0.01], 1e9);
        assert!((hot[0] - 0.5).abs() < 1e-6);
        assert!(boltzmann_weights(&[], 10.0).is_empty());
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(3.0, 4.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_xas_peaks_and_sum_rule() {
        let comm = SelfComm;
        let (ground_basis, inter_basis) = (sector(1), sector(2));
        let h_g = Hamiltonian::new(&levels(), ground_basis.clone(), &comm).unwrap();
        let h_n = Hamiltonian::new(&levels(), inter_basis.clone(), &comm).unwrap();
        let ground = diagonalize(&h_g, &DenseConfig::default()).unwrap();

        let mut creation = single(LadderOp::Create(1));
        creation.extend(single(LadderOp::Create(2)));
        let t = Hamiltonian::transition(&creation, inter_basis, ground_basis, &comm).unwrap();

        let config = XasConfig {
            gamma: 0.1,
            ..XasConfig::default()
        };
        let omegas = linspace(-20.0, 30.0, 5001);
        let spectrum = xas(&h_n, &ground, &[&t], &omegas, &config).unwrap();
        // only the ground state carries weight at room temperature
        assert_eq!(spectrum.fractions.len(), 1);
        assert!((spectrum.fractions[0].3.norm2 - 2.0).abs() < 1e-12);

        let at = |omega: f64| {
            let i = omegas
                .iter()
                .position(|&w| (w - omega).abs() < 1e-9)
                .unwrap();
            spectrum.intensity[i]
        };
        let peak = 1.0 / (PI * config.gamma);
        assert!((at(2.0) - peak).abs() < 1e-2);
        assert!((at(5.0) - peak).abs() < 1e-2);
        assert!(at(3.5) < 0.05 * peak);

        let dw = omegas[1] - omegas[0];
        let integral: f64 = spectrum
            .intensity
            .windows(2)
            .map(|pair| 0.5 * (pair[0] + pair[1]) * dw)
            .sum();
        assert!((integral - 2.0).abs() < 2e-2);

        let again = spectrum.evaluate(&omegas, config.gamma, &[ground[0].value]);
        for (a, b) in again.iter().zip(&spectrum.intensity) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_xas_requires_initial_states() {
        let comm = SelfComm;
        let h_n = Hamiltonian::new(&levels(), sector(2), &comm).unwrap();
        let err = xas(&h_n, &[], &[], &[0.0], &XasConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    fn rixs_map(comm: &dyn Communicator, omega_in: &[f64], loss: &[f64]) -> super::super::RixsMap {
        let (ground_basis, inter_basis) = (sector(1), sector(2));
        let h_g = Hamiltonian::new(&levels(), ground_basis.clone(), comm).unwrap();
        let h_n = Hamiltonian::new(&levels(), inter_basis.clone(), comm).unwrap();
        let ground = diagonalize(&h_g, &DenseConfig::default()).unwrap();

        let absorb = Hamiltonian::transition(
            &single(LadderOp::Create(1)),
            inter_basis.clone(),
            ground_basis.clone(),
            comm,
        )
        .unwrap();
        let emit_core = Hamiltonian::transition(
            &single(LadderOp::Annihilate(0)),
            ground_basis.clone(),
            inter_basis.clone(),
            comm,
        )
        .unwrap();
        let emit_elastic = Hamiltonian::transition(
            &single(LadderOp::Annihilate(1)),
            ground_basis,
            inter_basis,
            comm,
        )
        .unwrap();
        let config = RixsConfig {
            gamma_core: 0.1,
            gamma_final: 0.05,
            ..RixsConfig::default()
        };
        rixs(
            &h_n,
            &h_g,
            &ground,
            &[&absorb],
            &[&emit_core, &emit_elastic],
            omega_in,
            loss,
            &config,
        )
        .unwrap()
    }

    #[test]
    fn test_rixs_resonance() {
        let comm = SelfComm;
        let omega_in = [2.0, 4.0];
        let loss = [0.0, 1.0, 2.0];
        let map = rixs_map(&comm, &omega_in, &loss);
        assert_eq!(map.intensity.shape(), (2, 3));
        assert_eq!(map.unconverged, 0);

        // |x|^2 = 1 / gamma_core^2 on resonance
        let peak = 100.0 / (PI * 0.05);
        assert!((map.intensity[(0, 2)] - peak).abs() < 1e-2 * peak);
        assert!((map.intensity[(0, 0)] - peak).abs() < 1e-2 * peak);
        assert!(map.intensity[(0, 1)] < 1e-2 * peak);
        assert!(map.intensity[(0, 2)] > 100.0 * map.intensity[(1, 2)]);
    }

    #[test]
    fn test_rixs_rank_independent() {
        let omega_in = [1.5, 2.0];
        let loss = linspace(-1.0, 3.0, 9);
        let serial = rixs_map(&SelfComm, &omega_in, &loss);
        for map in run_ranks(2, |comm| rixs_map(comm, &omega_in, &loss)) {
            assert!((&map.intensity - &serial.intensity).norm() < 1e-8 * serial.intensity.norm());
        }
    }
}
