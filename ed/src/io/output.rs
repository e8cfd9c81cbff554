//! Output formatting and logging utilities

use color_eyre::eyre::Result;
use fock::{RixsMap, XasSpectrum};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = StdSystemTime::now();
        let duration = now
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();

        let total_seconds = duration.as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Setup output logging to file or stdout
pub fn setup_output(output_path: Option<&String>) {
    match output_path {
        Some(path) => {
            if let Ok(log) = File::create(path) {
                let file_layer = layer()
                    .with_writer(log)
                    .with_timer(SecondPrecisionTimer)
                    .with_ansi(false);
                Registry::default().with(file_layer).init();
                info!("Output will be written to: {}", path);
            } else {
                eprintln!("Could not create output file: {}", path);
            }
        }
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).init();
            info!("Output will be printed to stdout");
        }
    }
}

/// `index  energy  [⟨N⟩]` per eigenstate.
pub fn write_eigenvalues<W: Write>(
    writer: &mut W,
    energies: &[f64],
    occupations: Option<&[f64]>,
) -> Result<()> {
    for (i, energy) in energies.iter().enumerate() {
        match occupations {
            Some(n) => writeln!(writer, "{:>5} {:>20.12} {:>14.8}", i + 1, energy, n[i])?,
            None => writeln!(writer, "{:>5} {:>20.12}", i + 1, energy)?,
        }
    }
    Ok(())
}

/// `omega  intensity` per grid point.
pub fn write_spectrum<W: Write>(writer: &mut W, spectrum: &XasSpectrum) -> Result<()> {
    writeln!(writer, "# {:>14} {:>20}", "omega", "intensity")?;
    for (omega, intensity) in spectrum.omegas.iter().zip(&spectrum.intensity) {
        writeln!(writer, "{:>16.8} {:>20.12e}", omega, intensity)?;
    }
    Ok(())
}

/// `omega_in  energy_loss  intensity`, blocks separated by blank lines.
pub fn write_rixs_map<W: Write>(writer: &mut W, map: &RixsMap) -> Result<()> {
    writeln!(
        writer,
        "# {:>14} {:>16} {:>20}",
        "omega_in", "energy_loss", "intensity"
    )?;
    for (i, omega_in) in map.omega_in.iter().enumerate() {
        for (j, loss) in map.energy_loss.iter().enumerate() {
            writeln!(
                writer,
                "{:>16.8} {:>16.8} {:>20.12e}",
                omega_in,
                loss,
                map.intensity[(i, j)]
            )?;
        }
        writeln!(writer)?;
    }
    Ok(())
}
