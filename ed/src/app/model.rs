use crate::config::{Config, SectorConfig, TermsConfig};
use crate::io::{read_coulomb_file, read_hopping_file};
use color_eyre::eyre::{eyre, Result};
use fock::{Communicator, FockBasis, Hamiltonian, OperatorSum, OperatorTerm, Storage, C64};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Operator sum of inline and file terms; relative file names resolve
/// against `base`.
pub fn build_terms(terms: &TermsConfig, base: &Path) -> Result<OperatorSum> {
    let mut hopping = terms.hopping.clone();
    if let Some(file) = &terms.hopping_file {
        hopping.extend(read_hopping_file(&base.join(file))?);
    }
    let mut coulomb = terms.coulomb.clone();
    if let Some(file) = &terms.coulomb_file {
        coulomb.extend(read_coulomb_file(&base.join(file))?);
    }

    let mut sum = OperatorSum::new();
    for &(i, j, re, im) in &hopping {
        sum.push(OperatorTerm::hopping(
            zero_based(i)?,
            zero_based(j)?,
            C64::new(re, im),
        ));
    }
    for &(i, j, k, l, re, im) in &coulomb {
        sum.push(OperatorTerm::coulomb(
            zero_based(i)?,
            zero_based(j)?,
            zero_based(k)?,
            zero_based(l)?,
            C64::new(re, im),
        ));
    }
    Ok(sum)
}

fn zero_based(index: usize) -> Result<usize> {
    index
        .checked_sub(1)
        .ok_or_else(|| eyre!("Orbital indices are 1-based, found 0"))
}

pub fn build_basis(
    sector: &SectorConfig,
    config: &Config,
    name: &str,
    comm: &dyn Communicator,
) -> Result<Arc<FockBasis>> {
    let basis = FockBasis::new(&sector.to_sector(config.n_orbitals)?)?;
    if comm.is_root() {
        info!("{} sector: {} states on {} rank(s)", name, basis.dim(), comm.size());
    }
    Ok(Arc::new(basis))
}

/// Sector Hamiltonian with the configured storage.
pub fn build_hamiltonian<'a>(
    terms: &OperatorSum,
    basis: Arc<FockBasis>,
    config: &Config,
    comm: &'a dyn Communicator,
) -> Result<Hamiltonian<'a>> {
    let storage = config.solver.storage.unwrap_or(Storage::OnTheFly);
    let hamiltonian = Hamiltonian::new(terms, basis, comm)?.with_storage(storage)?;
    Ok(hamiltonian)
}
