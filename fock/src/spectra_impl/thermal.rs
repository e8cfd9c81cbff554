//! Thermal weights and frequency grids.

/// Boltzmann constant in eV/K.
pub const BOLTZMANN_EV: f64 = 8.617333262e-5;

/// Energy window treated as degenerate at zero temperature.
const DEGENERACY_TOL: f64 = 1e-8;

/// Normalized Boltzmann weights of `energies` (eV) at `temperature` (K).
///
/// At `temperature <= 0` the weight is shared equally by the degenerate
/// ground manifold.
pub fn boltzmann_weights(energies: &[f64], temperature: f64) -> Vec<f64> {
    let Some(e_min) = energies.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let raw: Vec<f64> = if temperature <= 0.0 {
        energies
            .iter()
            .map(|&e| if e - e_min <= DEGENERACY_TOL { 1.0 } else { 0.0 })
            .collect()
    } else {
        let kt = BOLTZMANN_EV * temperature;
        energies.iter().map(|&e| (-(e - e_min) / kt).exp()).collect()
    };
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// `n` evenly spaced points from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
