mod model;
mod report;
mod runner;
mod spectra;

pub use model::{build_basis, build_hamiltonian, build_terms};
pub use runner::{run_ed, solve_ground, solve_ground_sector, EdReport, GroundStates};
pub use spectra::{run_rixs, run_xas};

use self::report::{report_eigenvalues, report_rixs, report_xas};
use crate::config::{Args, Config, Mode};
use crate::io::{setup_output, write_eigenvalues, write_rixs_map, write_spectrum};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use fock::{Communicator, RixsMap, XasSpectrum};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of one run, as seen by the root rank.
#[derive(Debug, Clone)]
pub enum Outcome {
    Eigenvalues(EdReport),
    Xas(XasSpectrum),
    Rixs(RixsMap),
}

pub struct EdApplication {
    args: Args,
    config: Config,
    /// Directory the configuration file lives in; term files resolve
    /// against it.
    base: PathBuf,
}

impl EdApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let path = Path::new(&args.config_file);
        let config = Config::from_file(path)?.apply_args(&args);
        config.validate()?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self { args, config, base })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref());
        info!("Configuration loaded:\n{:?}", self.config);

        if let Some(outcome) = execute(&self.config, &self.base)? {
            write_outcome(&outcome, &self.config)?;
        }
        Ok(())
    }
}

/// Run the configured mode on `comm`. Collective.
pub fn run_calculation(comm: &dyn Communicator, config: &Config, base: &Path) -> Result<Outcome> {
    let outcome = match config.mode.unwrap_or(Mode::Ed) {
        Mode::Ed => Outcome::Eigenvalues(run_ed(comm, config, base)?),
        Mode::Xas => Outcome::Xas(run_xas(comm, config, base)?),
        Mode::Rixs => Outcome::Rixs(run_rixs(comm, config, base)?),
    };
    if comm.is_root() {
        match &outcome {
            Outcome::Eigenvalues(report) => report_eigenvalues(report),
            Outcome::Xas(spectrum) => report_xas(spectrum),
            Outcome::Rixs(map) => report_rixs(map),
        }
    }
    Ok(outcome)
}

#[cfg(feature = "mpi")]
fn execute(config: &Config, base: &Path) -> Result<Option<Outcome>> {
    use color_eyre::eyre::eyre;
    use fock::comm::MpiComm;

    let universe = mpi::initialize().ok_or_else(|| eyre!("MPI initialization failed"))?;
    let comm = MpiComm::new(universe.world());
    let outcome = run_calculation(&comm, config, base)?;
    Ok(comm.is_root().then_some(outcome))
}

#[cfg(not(feature = "mpi"))]
fn execute(config: &Config, base: &Path) -> Result<Option<Outcome>> {
    let ranks = config.ranks.unwrap_or(1);
    if ranks <= 1 {
        return run_calculation(&fock::SelfComm, config, base).map(Some);
    }
    info!("Running on {} in-process ranks", ranks);
    let outcomes = fock::run_ranks(ranks, |comm| run_calculation(comm, config, base));
    let mut root = None;
    for outcome in outcomes {
        let outcome = outcome?;
        root.get_or_insert(outcome);
    }
    Ok(root)
}

fn write_outcome(outcome: &Outcome, config: &Config) -> Result<()> {
    let dir = config.output_path("");
    fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("Unable to create output directory: {}", dir.display()))?;
    let (name, result) = match outcome {
        Outcome::Eigenvalues(report) => {
            let path = config.output_path("eigvals.dat");
            let mut file = File::create(&path)?;
            let occupations = report.occupations.as_deref();
            (path, write_eigenvalues(&mut file, &report.energies, occupations))
        }
        Outcome::Xas(spectrum) => {
            let path = config.output_path("xas.dat");
            let mut file = File::create(&path)?;
            (path, write_spectrum(&mut file, spectrum))
        }
        Outcome::Rixs(map) => {
            let path = config.output_path("rixs.dat");
            let mut file = File::create(&path)?;
            (path, write_rixs_map(&mut file, map))
        }
    };
    result.wrap_err_with(|| format!("Unable to write {}", name.display()))?;
    info!("Results written to: {}", name.display());
    Ok(())
}
