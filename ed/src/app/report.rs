use super::runner::EdReport;
use fock::{RixsMap, XasSpectrum};
use tracing::info;

pub fn report_eigenvalues(report: &EdReport) {
    info!("\nED calculation finished.");
    info!("\nEigenvalues:");
    let e0 = report.energies.first().copied().unwrap_or_default();
    for (i, energy) in report.energies.iter().enumerate() {
        match &report.occupations {
            Some(n) => info!(
                "  State {:>3}: {:>16.10}  (E - E0 = {:.6}, <N> = {:.6})",
                i + 1,
                energy,
                energy - e0,
                n[i]
            ),
            None => info!("  State {:>3}: {:>16.10}  (E - E0 = {:.6})", i + 1, energy, energy - e0),
        }
    }
}

pub fn report_xas(spectrum: &XasSpectrum) {
    info!("\nXAS calculation finished.");
    let peak = spectrum
        .omegas
        .iter()
        .zip(&spectrum.intensity)
        .max_by(|a, b| a.1.total_cmp(b.1));
    if let Some((omega, intensity)) = peak {
        info!("  Strongest absorption at omega = {:.4} eV ({:.6e})", omega, intensity);
    }
    info!("  Continued fractions evaluated: {}", spectrum.fractions.len());
}

pub fn report_rixs(map: &RixsMap) {
    info!("\nRIXS calculation finished.");
    info!(
        "  Map: {} incident energies x {} energy losses",
        map.omega_in.len(),
        map.energy_loss.len()
    );
    info!("  Maximum intensity: {:.6e}", map.intensity.max());
    if map.unconverged > 0 {
        info!("  Unconverged resolvent solves: {}", map.unconverged);
    }
}
