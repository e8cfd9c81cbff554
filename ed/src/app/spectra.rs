use super::model::{build_basis, build_hamiltonian, build_terms};
use super::runner::solve_ground_sector;
use crate::config::{Config, TermsConfig};
use color_eyre::eyre::{eyre, Result, WrapErr};
use fock::{rixs, xas, Communicator, FockBasis, Hamiltonian, RixsMap, SectorOperator, XasSpectrum};
use std::path::Path;
use std::sync::Arc;

pub fn run_xas(comm: &dyn Communicator, config: &Config, base: &Path) -> Result<XasSpectrum> {
    let params = config
        .xas
        .as_ref()
        .ok_or_else(|| eyre!("Missing `xas` section"))?;
    let ground = solve_ground_sector(comm, config, base)?;
    let (inter_basis, h_n) = intermediate_hamiltonian(comm, config, base)?;

    let transitions =
        transition_operators(&params.transitions, &inter_basis, &ground.basis, base, comm)?;
    let transitions: Vec<&dyn SectorOperator> =
        transitions.iter().map(|t| t as &dyn SectorOperator).collect();
    let omegas = params.omega.values();
    let spectrum = xas(&h_n, &ground.eigenpairs, &transitions, &omegas, &params.settings)?;
    Ok(spectrum)
}

/// The final sector is the ground sector with the ground Hamiltonian.
pub fn run_rixs(comm: &dyn Communicator, config: &Config, base: &Path) -> Result<RixsMap> {
    let params = config
        .rixs
        .as_ref()
        .ok_or_else(|| eyre!("Missing `rixs` section"))?;
    let ground = solve_ground_sector(comm, config, base)?;
    let (inter_basis, h_n) = intermediate_hamiltonian(comm, config, base)?;
    let h_f = build_hamiltonian(&ground.terms, ground.basis.clone(), config, comm)?;

    let absorption =
        transition_operators(&params.absorption, &inter_basis, &ground.basis, base, comm)?;
    let emission =
        transition_operators(&params.emission, &ground.basis, &inter_basis, base, comm)?;
    let absorption: Vec<&dyn SectorOperator> =
        absorption.iter().map(|t| t as &dyn SectorOperator).collect();
    let emission: Vec<&dyn SectorOperator> =
        emission.iter().map(|t| t as &dyn SectorOperator).collect();

    let map = rixs(
        &h_n,
        &h_f,
        &ground.eigenpairs,
        &absorption,
        &emission,
        &params.omega_in.values(),
        &params.energy_loss.values(),
        &params.settings,
    )?;
    Ok(map)
}

fn intermediate_hamiltonian<'a>(
    comm: &'a dyn Communicator,
    config: &Config,
    base: &Path,
) -> Result<(Arc<FockBasis>, Hamiltonian<'a>)> {
    let sector = config
        .intermediate
        .as_ref()
        .ok_or_else(|| eyre!("Missing `intermediate` sector"))?;
    let basis = build_basis(sector, config, "Intermediate", comm)?;
    let terms = config
        .intermediate_hamiltonian
        .as_ref()
        .unwrap_or(&config.hamiltonian);
    let terms = build_terms(terms, base).wrap_err("Invalid intermediate Hamiltonian")?;
    let hamiltonian = build_hamiltonian(&terms, basis.clone(), config, comm)?;
    Ok((basis, hamiltonian))
}

/// One operator from `right` to `left` per entry.
fn transition_operators<'a>(
    entries: &[TermsConfig],
    left: &Arc<FockBasis>,
    right: &Arc<FockBasis>,
    base: &Path,
    comm: &'a dyn Communicator,
) -> Result<Vec<Hamiltonian<'a>>> {
    entries
        .iter()
        .map(|entry| {
            let terms = build_terms(entry, base).wrap_err("Invalid transition operator")?;
            let op = Hamiltonian::transition(&terms, left.clone(), right.clone(), comm)?;
            Ok(op)
        })
        .collect()
}
