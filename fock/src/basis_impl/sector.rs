//! Sector descriptors: which Fock states belong to a basis.

use super::fock::{binomial, FockState, MAX_ORBITALS};
use crate::error::{Error, Result};
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;

/// Extra conserved-quantity filter applied on top of the occupation rule.
pub type SectorPredicate = Arc<dyn Fn(FockState) -> bool + Send + Sync>;

/// Largest orbital count for which all 2^n states are enumerated.
const MAX_ANY_ORBITALS: usize = 32;

/// Occupation rule of a sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupation {
    /// Fixed total particle number.
    Fixed(usize),
    /// Every occupation pattern (no number conservation).
    Any,
    /// Consecutive shells `(orbitals, particles)`, shell 0 on the lowest
    /// orbitals; the basis is the product of the per-shell combinations.
    Shells(Vec<(usize, usize)>),
}

/// Sector constraints, passed explicitly to every basis construction.
#[derive(Clone)]
pub struct Sector {
    n_orbitals: usize,
    occupation: Occupation,
    predicate: Option<SectorPredicate>,
}

impl fmt::Debug for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sector")
            .field("n_orbitals", &self.n_orbitals)
            .field("occupation", &self.occupation)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl Sector {
    pub fn fixed(n_orbitals: usize, n_particles: usize) -> Self {
        Sector {
            n_orbitals,
            occupation: Occupation::Fixed(n_particles),
            predicate: None,
        }
    }

    pub fn any(n_orbitals: usize) -> Self {
        Sector {
            n_orbitals,
            occupation: Occupation::Any,
            predicate: None,
        }
    }

    pub fn shells(shells: &[(usize, usize)]) -> Self {
        Sector {
            n_orbitals: shells.iter().map(|&(n, _)| n).sum(),
            occupation: Occupation::Shells(shells.to_vec()),
            predicate: None,
        }
    }

    /// Keep only the states accepted by `predicate`.
    pub fn with_predicate(mut self, predicate: SectorPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn n_orbitals(&self) -> usize {
        self.n_orbitals
    }

    pub fn occupation(&self) -> &Occupation {
        &self.occupation
    }

    pub fn accepts(&self, state: FockState) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(state))
    }

    /// Number of states before the predicate is applied.
    pub fn unfiltered_dim(&self) -> u64 {
        match &self.occupation {
            Occupation::Fixed(n) => binomial(self.n_orbitals, *n),
            Occupation::Any => 1u64 << self.n_orbitals.min(63),
            Occupation::Shells(shells) => shells.iter().map(|&(n, k)| binomial(n, k)).product(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.n_orbitals > MAX_ORBITALS {
            return Err(Error::InvalidSector(format!(
                "{} orbitals exceed the {}-bit Fock state",
                self.n_orbitals, MAX_ORBITALS
            )));
        }
        match &self.occupation {
            Occupation::Fixed(n) if *n > self.n_orbitals => Err(Error::InvalidSector(format!(
                "{} particles in {} orbitals",
                n, self.n_orbitals
            ))),
            Occupation::Any if self.n_orbitals > MAX_ANY_ORBITALS => {
                Err(Error::InvalidSector(format!(
                    "unrestricted occupation of {} orbitals is too large to enumerate (limit {})",
                    self.n_orbitals, MAX_ANY_ORBITALS
                )))
            }
            Occupation::Shells(shells) => {
                match shells.iter().position(|&(n, k)| k > n) {
                    Some(i) => Err(Error::InvalidSector(format!(
                        "shell {} holds {} particles in {} orbitals",
                        i, shells[i].1, shells[i].0
                    ))),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// All states of the sector, unsorted.
    pub(crate) fn enumerate(&self) -> Result<Vec<FockState>> {
        self.validate()?;
        let raw: Vec<u64> = match &self.occupation {
            Occupation::Fixed(n) => combinations(self.n_orbitals, *n, 0),
            Occupation::Any => (0..(1u64 << self.n_orbitals)).collect(),
            Occupation::Shells(shells) => {
                let mut offset = 0;
                let mut product = vec![0u64];
                for &(n, k) in shells {
                    let shell = combinations(n, k, offset);
                    product = product
                        .iter()
                        .cartesian_product(shell.iter())
                        .map(|(a, b)| a | b)
                        .collect();
                    offset += n;
                }
                product
            }
        };
        Ok(raw
            .into_iter()
            .map(FockState)
            .filter(|&s| self.accepts(s))
            .collect())
    }
}

/// Bit patterns with `k` of the orbitals `offset..offset + n` occupied.
fn combinations(n: usize, k: usize, offset: usize) -> Vec<u64> {
    (0..n)
        .combinations(k)
        .map(|occ| occ.iter().fold(0u64, |bits, &i| bits | (1u64 << (i + offset))))
        .collect()
}

/// Predicate selecting total `2 Sz = n_up - n_down` for spin-orbitals laid out
/// as alternating up (even index) and down (odd index) spins.
pub fn sz_predicate(two_sz: i32) -> SectorPredicate {
    const EVEN: u64 = 0x5555_5555_5555_5555;
    Arc::new(move |state: FockState| {
        let up = (state.bits() & EVEN).count_ones() as i32;
        let down = (state.bits() & !EVEN).count_ones() as i32;
        up - down == two_sz
    })
}
