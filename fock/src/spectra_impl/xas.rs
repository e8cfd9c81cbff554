//! XAS from continued fractions.

use super::thermal::boltzmann_weights;
use crate::eigen::Eigenpair;
use crate::error::{Error, Result};
use crate::hamiltonian_impl::SectorOperator;
use crate::lanczos_impl::{continued_fraction, ContinuedFraction};
use serde::Deserialize;
use tracing::info;

/// XAS settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct XasConfig {
    /// Lanczos steps per continued fraction.
    pub n_steps: usize,
    /// Core-hole broadening (HWHM, eV).
    pub gamma: f64,
    /// Temperature in K.
    pub temperature: f64,
    /// Initial states with a smaller thermal weight are skipped.
    pub weight_cutoff: f64,
}

impl Default for XasConfig {
    fn default() -> Self {
        XasConfig {
            n_steps: 300,
            gamma: 0.1,
            temperature: 300.0,
            weight_cutoff: 1e-6,
        }
    }
}

/// Absorption spectrum and the fractions it was evaluated from.
#[derive(Debug, Clone)]
pub struct XasSpectrum {
    pub omegas: Vec<f64>,
    pub intensity: Vec<f64>,
    /// `(initial state, transition, weight, fraction)` for each evaluated pair.
    pub fractions: Vec<(usize, usize, f64, ContinuedFraction)>,
}

impl XasSpectrum {
    /// Re-evaluate the stored fractions on another grid or broadening.
    pub fn evaluate(&self, omegas: &[f64], gamma: f64, energies: &[f64]) -> Vec<f64> {
        let mut intensity = vec![0.0; omegas.len()];
        for (g, _, weight, cf) in &self.fractions {
            for (value, &omega) in intensity.iter_mut().zip(omegas) {
                *value += weight * cf.spectral_function(omega, energies[*g], gamma);
            }
        }
        intensity
    }
}

/// `I(ω) = Σ_g w_g Σ_T -Im ⟨g|T† (ω + E_g + iΓ - H_n)⁻¹ T|g⟩ / π`.
/// Collective.
///
/// Each transition maps the ground sector onto the intermediate sector of
/// `h_n`.
pub fn xas(
    h_n: &dyn SectorOperator,
    ground: &[Eigenpair],
    transitions: &[&dyn SectorOperator],
    omegas: &[f64],
    config: &XasConfig,
) -> Result<XasSpectrum> {
    if ground.is_empty() {
        return Err(Error::InvalidArgument("XAS without initial states".to_string()));
    }
    let energies: Vec<f64> = ground.iter().map(|p| p.value).collect();
    let weights = boltzmann_weights(&energies, config.temperature);
    let root = h_n.comm().is_root();
    if root {
        info!("===========================================");
        info!("        XAS Calculation");
        info!("===========================================");
        info!("Intermediate dimension: {}", h_n.dim());
        info!("Initial states: {}", ground.len());
        info!("Transition operators: {}", transitions.len());
        info!("Temperature: {} K, Gamma: {} eV", config.temperature, config.gamma);
    }

    let mut spectrum = XasSpectrum {
        omegas: omegas.to_vec(),
        intensity: vec![0.0; omegas.len()],
        fractions: Vec::new(),
    };
    for (g, (pair, &weight)) in ground.iter().zip(&weights).enumerate() {
        if weight < config.weight_cutoff {
            continue;
        }
        for (t, op) in transitions.iter().enumerate() {
            let excited = op.apply(&pair.vector)?;
            let cf = continued_fraction(h_n, &excited, config.n_steps)?;
            for (value, &omega) in spectrum.intensity.iter_mut().zip(omegas) {
                *value += weight * cf.spectral_function(omega, pair.value, config.gamma);
            }
            if root {
                info!(
                    "  State {} (weight {:.4}), operator {}: |T g|^2 = {:.6}, {} steps",
                    g,
                    weight,
                    t,
                    cf.norm2,
                    cf.len()
                );
            }
            spectrum.fractions.push((g, t, weight, cf));
        }
    }
    if root {
        info!("===========================================");
    }
    Ok(spectrum)
}
