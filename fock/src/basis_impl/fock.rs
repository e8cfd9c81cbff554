//! Occupation-number bitstrings.

use std::fmt;

/// Largest number of spin-orbitals a Fock state can hold.
pub const MAX_ORBITALS: usize = 64;

/// One Fock state; bit `i` is the occupation of orbital `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FockState(pub u64);

impl FockState {
    pub fn from_orbitals<I: IntoIterator<Item = usize>>(orbitals: I) -> Self {
        FockState(orbitals.into_iter().fold(0u64, |bits, i| bits | (1u64 << i)))
    }

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn is_occupied(self, orbital: usize) -> bool {
        (self.0 >> orbital) & 1 == 1
    }

    pub fn n_particles(self) -> u32 {
        self.0.count_ones()
    }

    /// Number of occupied orbitals with index lower than `orbital`.
    ///
    /// Its parity is the fermionic sign picked up by a ladder operator on
    /// `orbital` when it is moved past the operators of those orbitals.
    #[inline]
    pub fn occupied_below(self, orbital: usize) -> u32 {
        (self.0 & ((1u64 << orbital) - 1)).count_ones()
    }

    /// The state with the occupation of `orbital` toggled.
    #[inline]
    pub fn flip(self, orbital: usize) -> Self {
        FockState(self.0 ^ (1u64 << orbital))
    }

    /// Occupied orbitals in ascending order.
    pub fn occupied(self) -> impl Iterator<Item = usize> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let i = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            Some(i)
        })
    }

    /// Occupations of the first `n_orbitals` orbitals as a string of 0/1,
    /// orbital 0 first.
    pub fn occupation_string(self, n_orbitals: usize) -> String {
        (0..n_orbitals)
            .map(|i| if self.is_occupied(i) { '1' } else { '0' })
            .collect()
    }
}

impl fmt::Display for FockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#b}", self.0)
    }
}

/// Binomial coefficient C(n, k), zero when k > n.
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1u128, |acc, i| acc * (n - i) as u128 / (i + 1) as u128) as u64
}
