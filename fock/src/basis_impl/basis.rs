//! Sorted basis with rank lookup.

use super::fock::{FockState, MAX_ORBITALS};
use super::sector::Sector;
use crate::error::{Error, Result};
use crate::partition::Partition;
use tracing::debug;

/// Bijection between the Fock states of a sector and `0..dim`.
///
/// States are kept in ascending bit order; every process building the basis
/// from the same sector obtains the same ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FockBasis {
    n_orbitals: usize,
    states: Vec<FockState>,
}

impl FockBasis {
    pub fn new(sector: &Sector) -> Result<Self> {
        let states = sector.enumerate()?;
        let basis = Self::from_states(sector.n_orbitals(), states)?;
        debug!(
            "Enumerated {:?}: dimension {} ({} before filtering)",
            sector.occupation(),
            basis.dim(),
            sector.unfiltered_dim()
        );
        Ok(basis)
    }

    /// Basis from an explicit list of states (sorted and deduplicated here).
    pub fn from_states(n_orbitals: usize, mut states: Vec<FockState>) -> Result<Self> {
        if n_orbitals > MAX_ORBITALS {
            return Err(Error::InvalidSector(format!(
                "{} orbitals exceed the {}-bit Fock state",
                n_orbitals, MAX_ORBITALS
            )));
        }
        if let Some(s) = states
            .iter()
            .find(|s| n_orbitals < MAX_ORBITALS && s.bits() >> n_orbitals != 0)
        {
            return Err(Error::InvalidSector(format!(
                "state {} occupies orbitals beyond {}",
                s, n_orbitals
            )));
        }
        states.sort_unstable();
        states.dedup();
        if states.is_empty() {
            return Err(Error::InvalidSector("sector contains no Fock state".to_string()));
        }
        Ok(FockBasis { n_orbitals, states })
    }

    pub fn dim(&self) -> usize {
        self.states.len()
    }

    pub fn n_orbitals(&self) -> usize {
        self.n_orbitals
    }

    pub fn states(&self) -> &[FockState] {
        &self.states
    }

    pub fn state(&self, rank: usize) -> FockState {
        self.states[rank]
    }

    /// Rank of `state`, or `None` when it is not part of the basis.
    #[inline]
    pub fn rank_of(&self, state: FockState) -> Option<usize> {
        self.states.binary_search(&state).ok()
    }

    pub fn contains(&self, state: FockState) -> bool {
        self.rank_of(state).is_some()
    }

    /// Even contiguous split of the basis over `n_ranks` ranks.
    pub fn partition(&self, n_ranks: usize) -> Partition {
        Partition::even(self.dim(), n_ranks)
    }
}
