//! Configuration management for ED calculations
//!
//! This module handles configuration structures, defaults, and validation
//! for ground-state, XAS and RIXS runs.

mod args;

pub use args::Args;

use clap::ValueEnum;
use color_eyre::eyre::{bail, Result, WrapErr};
use fock::{sz_predicate, DenseConfig, IrlConfig, LanczosConfig, RixsConfig, Sector, Storage, XasConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// `[i, j, re, im]`: `(re + i im) c†_i c_j`, 1-based.
pub type HoppingEntry = (usize, usize, f64, f64);

/// `[i, j, k, l, re, im]`: `(re + i im) c†_i c†_j c_k c_l`, 1-based.
pub type CoulombEntry = (usize, usize, usize, usize, f64, f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Lowest eigenstates of the ground sector
    Ed,
    Xas,
    Rixs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    Dense,
    Lanczos,
    Arpack,
}

/// Main configuration structure for ED calculations
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mode: Option<Mode>,
    pub n_orbitals: usize,
    pub ground: SectorConfig,
    /// Core-hole sector of XAS/RIXS.
    pub intermediate: Option<SectorConfig>,
    #[serde(default)]
    pub hamiltonian: TermsConfig,
    /// Hamiltonian of the intermediate sector; the ground one when unset.
    pub intermediate_hamiltonian: Option<TermsConfig>,
    #[serde(default)]
    pub solver: SolverParams,
    pub xas: Option<XasParams>,
    pub rixs: Option<RixsParams>,
    pub ranks: Option<usize>,
    pub output_dir: Option<String>,
}

/// Occupation constraints of one sector.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectorConfig {
    /// Total particle number.
    pub particles: Option<usize>,
    /// `[orbitals, particles]` per shell, lowest orbitals first.
    pub shells: Option<Vec<(usize, usize)>>,
    /// Twice the total S_z (even orbitals spin up).
    pub two_sz: Option<i32>,
}

/// Operator terms given inline or through term files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermsConfig {
    #[serde(default)]
    pub hopping: Vec<HoppingEntry>,
    #[serde(default)]
    pub coulomb: Vec<CoulombEntry>,
    pub hopping_file: Option<String>,
    pub coulomb_file: Option<String>,
}

/// Eigensolver parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SolverParams {
    pub kind: Option<SolverKind>,
    pub n_eigen: Option<usize>,
    pub storage: Option<Storage>,
    /// Log ⟨N⟩ of every eigenstate.
    pub report_occupation: Option<bool>,
    #[serde(default)]
    pub dense: DenseConfig,
    #[serde(default)]
    pub lanczos: LanczosConfig,
    #[serde(default)]
    pub arpack: IrlConfig,
}

impl SolverParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.kind.is_none() {
            self.kind = Some(SolverKind::Lanczos);
        }
        if self.n_eigen.is_none() {
            self.n_eigen = Some(1);
        }
        if self.storage.is_none() {
            self.storage = Some(Storage::OnTheFly);
        }
        if self.report_occupation.is_none() {
            self.report_occupation = Some(true);
        }
        self
    }
}

/// `points` evenly spaced energies from `start` to `stop` (eV).
#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    pub start: f64,
    pub stop: f64,
    pub points: usize,
}

impl GridConfig {
    pub fn values(&self) -> Vec<f64> {
        fock::linspace(self.start, self.stop, self.points)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct XasParams {
    /// One transition operator per polarization.
    pub transitions: Vec<TermsConfig>,
    pub omega: GridConfig,
    #[serde(flatten)]
    pub settings: XasConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RixsParams {
    pub absorption: Vec<TermsConfig>,
    pub emission: Vec<TermsConfig>,
    pub omega_in: GridConfig,
    pub energy_loss: GridConfig,
    #[serde(flatten)]
    pub settings: RixsConfig,
}

impl SectorConfig {
    pub fn to_sector(&self, n_orbitals: usize) -> Result<Sector> {
        let sector = match (&self.shells, self.particles) {
            (Some(_), Some(_)) => bail!("A sector takes either `shells` or `particles`, not both"),
            (Some(shells), None) => {
                let total: usize = shells.iter().map(|&(n, _)| n).sum();
                if total != n_orbitals {
                    bail!("Shells cover {} orbitals, expected {}", total, n_orbitals);
                }
                Sector::shells(shells)
            }
            (None, Some(n)) => Sector::fixed(n_orbitals, n),
            (None, None) => Sector::any(n_orbitals),
        };
        Ok(match self.two_sz {
            Some(two_sz) => sector.with_predicate(sz_predicate(two_sz)),
            None => sector,
        })
    }
}

impl Config {
    /// Read and parse a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Unable to read configuration file: {}", path.display()))?;
        let config = serde_yml::from_str::<Config>(&content)
            .wrap_err("Failed to parse configuration file")?
            .with_defaults();
        Ok(config)
    }

    /// Apply default values to any missing configuration fields
    pub fn with_defaults(mut self) -> Self {
        if self.mode.is_none() {
            self.mode = Some(Mode::Ed);
        }
        if self.ranks.is_none() {
            self.ranks = Some(1);
        }
        if self.output_dir.is_none() {
            self.output_dir = Some(".".to_string());
        }
        self.solver = self.solver.with_defaults();
        self
    }

    /// Command-line values take precedence over the file.
    pub fn apply_args(mut self, args: &Args) -> Self {
        self.mode = args.mode.or(self.mode);
        self.solver.kind = args.solver.or(self.solver.kind);
        self.solver.n_eigen = args.n_eigen.or(self.solver.n_eigen);
        self.ranks = args.ranks.or(self.ranks);
        self.output_dir = args.output_dir.clone().or(self.output_dir);
        if let Some(temperature) = args.temperature {
            if let Some(xas) = self.xas.as_mut() {
                xas.settings.temperature = temperature;
            }
            if let Some(rixs) = self.rixs.as_mut() {
                rixs.settings.temperature = temperature;
            }
        }
        self
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        Path::new(self.output_dir.as_deref().unwrap_or(".")).join(name)
    }

    /// Check that the sections needed by the selected mode are present.
    pub fn validate(&self) -> Result<()> {
        let needs_intermediate = match self.mode {
            Some(Mode::Xas) => {
                if self.xas.is_none() {
                    bail!("Mode `xas` needs an `xas` section");
                }
                true
            }
            Some(Mode::Rixs) => {
                if self.rixs.is_none() {
                    bail!("Mode `rixs` needs a `rixs` section");
                }
                true
            }
            _ => false,
        };
        if needs_intermediate && self.intermediate.is_none() {
            bail!("Spectra need an `intermediate` sector");
        }
        if self.ranks == Some(0) {
            bail!("At least one rank is needed");
        }
        Ok(())
    }
}
