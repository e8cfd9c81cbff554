use super::model::{build_basis, build_hamiltonian, build_terms};
use crate::config::{Config, SolverKind, SolverParams};
use color_eyre::eyre::{Result, WrapErr};
use fock::{
    diagonalize, eigsh, lanczos, number_operator, Communicator, DenseConfig, Eigenpair, FockBasis,
    Hamiltonian, IrlConfig, LanczosConfig, OperatorSum, SectorOperator,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Lowest eigenstates of the ground sector.
#[derive(Debug, Clone)]
pub struct EdReport {
    pub energies: Vec<f64>,
    /// ⟨N⟩ per eigenstate, when requested.
    pub occupations: Option<Vec<f64>>,
}

/// Ground basis, its terms, and the lowest eigenpairs.
pub struct GroundStates {
    pub basis: Arc<FockBasis>,
    pub terms: OperatorSum,
    pub eigenpairs: Vec<Eigenpair>,
}

pub fn run_ed(comm: &dyn Communicator, config: &Config, base: &Path) -> Result<EdReport> {
    let ground = solve_ground_sector(comm, config, base)?;
    let energies = ground.eigenpairs.iter().map(|p| p.value).collect();

    let occupations = if config.solver.report_occupation.unwrap_or(false) {
        let n_op = Hamiltonian::new(&number_operator(config.n_orbitals), ground.basis, comm)?;
        let values = ground
            .eigenpairs
            .iter()
            .map(|p| n_op.expectation(&p.vector).map(|n| n.re))
            .collect::<fock::Result<Vec<f64>>>()?;
        Some(values)
    } else {
        None
    };
    Ok(EdReport {
        energies,
        occupations,
    })
}

pub fn solve_ground_sector(
    comm: &dyn Communicator,
    config: &Config,
    base: &Path,
) -> Result<GroundStates> {
    let basis = build_basis(&config.ground, config, "Ground", comm)?;
    let terms = build_terms(&config.hamiltonian, base).wrap_err("Invalid ground Hamiltonian")?;
    let hamiltonian = build_hamiltonian(&terms, basis.clone(), config, comm)?;
    let eigenpairs = solve_ground(&hamiltonian, &config.solver)?;
    Ok(GroundStates {
        basis,
        terms,
        eigenpairs,
    })
}

/// Dispatch to the configured eigensolver for the lowest `n_eigen` states.
pub fn solve_ground(hamiltonian: &Hamiltonian, params: &SolverParams) -> Result<Vec<Eigenpair>> {
    let dim = hamiltonian.dim();
    let n_eigen = params.n_eigen.unwrap_or(1).min(dim);
    let root = hamiltonian.comm().is_root();
    let mut kind = params.kind.unwrap_or(SolverKind::Lanczos);
    if kind == SolverKind::Arpack && n_eigen >= dim {
        if root {
            warn!(
                "IRL needs fewer wanted states than the dimension ({} >= {}), using dense",
                n_eigen, dim
            );
        }
        kind = SolverKind::Dense;
    }
    if root {
        info!("Solving for {} eigenstate(s) with {:?}", n_eigen, kind);
    }

    let eigenpairs = match kind {
        SolverKind::Dense => {
            let config = DenseConfig {
                n_eigen: Some(n_eigen),
                ..params.dense.clone()
            };
            diagonalize(hamiltonian, &config)?
        }
        SolverKind::Lanczos => {
            let config = LanczosConfig {
                n_eigen,
                ..params.lanczos.clone()
            };
            lanczos(hamiltonian, &config, None)?
                .into_converged()
                .wrap_err("Lanczos did not converge")?
                .eigenpairs
        }
        SolverKind::Arpack => {
            let config = IrlConfig {
                nev: n_eigen,
                ..params.arpack.clone()
            };
            eigsh(hamiltonian, &config, None)?
                .into_converged()
                .wrap_err("Implicitly restarted Lanczos did not converge")?
                .eigenpairs
        }
    };
    Ok(eigenpairs)
}
