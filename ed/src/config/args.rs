//! Command-line argument parsing for ED calculations

use super::{Mode, SolverKind};
use clap::Parser;

/// Exact diagonalization and core-level spectra with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "ed.yaml")]
    pub config_file: String,

    /// Override calculation mode
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Override eigensolver
    #[arg(long, value_enum)]
    pub solver: Option<SolverKind>,

    /// Override number of eigenstates
    #[arg(long)]
    pub n_eigen: Option<usize>,

    /// Number of in-process ranks (ignored with MPI)
    #[arg(long)]
    pub ranks: Option<usize>,

    /// Override temperature of XAS/RIXS (K)
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Directory for result files
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}
