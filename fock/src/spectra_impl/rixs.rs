//! RIXS maps from resolvent solves and continued fractions.

extern crate nalgebra as na;

use super::thermal::boltzmann_weights;
use crate::eigen::Eigenpair;
use crate::error::{Error, Result};
use crate::hamiltonian_impl::SectorOperator;
use crate::lanczos_impl::continued_fraction;
use crate::resolvent_impl::{solve, ResolventConfig};
use na::DMatrix;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// RIXS settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RixsConfig {
    /// Core-hole broadening of the intermediate states (eV).
    pub gamma_core: f64,
    /// Broadening of the final states (eV).
    pub gamma_final: f64,
    /// Lanczos steps per continued fraction of the final Hamiltonian.
    pub n_steps: usize,
    /// Temperature in K.
    pub temperature: f64,
    pub weight_cutoff: f64,
    pub resolvent: ResolventConfig,
}

impl Default for RixsConfig {
    fn default() -> Self {
        RixsConfig {
            gamma_core: 0.2,
            gamma_final: 0.05,
            n_steps: 300,
            temperature: 300.0,
            weight_cutoff: 1e-6,
            resolvent: ResolventConfig::default(),
        }
    }
}

/// Intensity on the `(ω_in, energy loss)` grid.
#[derive(Debug, Clone)]
pub struct RixsMap {
    pub omega_in: Vec<f64>,
    pub energy_loss: Vec<f64>,
    /// Rows follow `omega_in`, columns `energy_loss`.
    pub intensity: DMatrix<f64>,
    /// Resolvent solves that stopped at the iteration cap.
    pub unconverged: usize,
}

/// `I(ω_in, ω_loss) = Σ_g w_g Σ_{abs, emi} -Im ⟨F|(ω_loss + E_g + iΓ_f - H_f)⁻¹|F⟩ / π`
/// with `|F⟩ = T_emi (ω_in + E_g + iΓ_c - H_n)⁻¹ T_abs |g⟩`. Collective.
///
/// Unconverged resolvent solves still contribute; they are counted in the
/// result and reported.
#[allow(clippy::too_many_arguments)]
pub fn rixs(
    h_n: &dyn SectorOperator,
    h_f: &dyn SectorOperator,
    ground: &[Eigenpair],
    absorption: &[&dyn SectorOperator],
    emission: &[&dyn SectorOperator],
    omega_in: &[f64],
    energy_loss: &[f64],
    config: &RixsConfig,
) -> Result<RixsMap> {
    if ground.is_empty() {
        return Err(Error::InvalidArgument("RIXS without initial states".to_string()));
    }
    let energies: Vec<f64> = ground.iter().map(|p| p.value).collect();
    let weights = boltzmann_weights(&energies, config.temperature);
    let root = h_n.comm().is_root();
    if root {
        info!("===========================================");
        info!("        RIXS Calculation");
        info!("===========================================");
        info!("Intermediate dimension: {}", h_n.dim());
        info!("Final dimension: {}", h_f.dim());
        info!("Initial states: {}", ground.len());
        info!(
            "Absorption / emission operators: {} / {}",
            absorption.len(),
            emission.len()
        );
        info!("Incident energies: {}", omega_in.len());
        info!(
            "Gamma core: {} eV, Gamma final: {} eV",
            config.gamma_core, config.gamma_final
        );
    }

    let mut map = RixsMap {
        omega_in: omega_in.to_vec(),
        energy_loss: energy_loss.to_vec(),
        intensity: DMatrix::zeros(omega_in.len(), energy_loss.len()),
        unconverged: 0,
    };
    for (g, (pair, &weight)) in ground.iter().zip(&weights).enumerate() {
        if weight < config.weight_cutoff {
            continue;
        }
        let excited: Vec<_> = absorption
            .iter()
            .map(|op| op.apply(&pair.vector))
            .collect::<Result<_>>()?;
        for (i, &omega) in omega_in.iter().enumerate() {
            for b in &excited {
                let psi = solve(h_n, pair.value, omega, config.gamma_core, b, &config.resolvent)?;
                if !psi.converged {
                    map.unconverged += 1;
                    if root {
                        warn!(
                            "Resolvent not converged at omega_in = {:.4} (state {}, residual {:.2e})",
                            omega, g, psi.residual
                        );
                    }
                }
                for op in emission {
                    let f = op.apply(&psi.solution)?;
                    let cf = continued_fraction(h_f, &f, config.n_steps)?;
                    for (j, &loss) in energy_loss.iter().enumerate() {
                        map.intensity[(i, j)] +=
                            weight * cf.spectral_function(loss, pair.value, config.gamma_final);
                    }
                }
            }
            if root {
                debug!("RIXS omega_in = {:.4} done for state {}", omega, g);
            }
        }
    }
    if root {
        if map.unconverged > 0 {
            warn!("{} resolvent solves did not converge", map.unconverged);
        }
        info!("===========================================");
    }
    Ok(map)
}
