//! Fock-space basis generation
//!
//! A many-body basis state is an occupation bitstring over at most 64
//! spin-orbitals. A sector collects the states sharing conserved quantities
//! (particle number, per-shell occupations, anything an extra predicate can
//! express) and the basis keeps them sorted so a state's rank is found by
//! binary search.
//!
//! # Usage
//!
//! ```rust,ignore
//! use fock::{FockBasis, Sector};
//!
//! // 10 spin-orbitals (a d shell) with 8 electrons
//! let basis = FockBasis::new(&Sector::fixed(10, 8))?;
//! assert_eq!(basis.dim(), 45);
//!
//! // 3d^8 valence shell times a full 2p core shell with one hole
//! let basis = FockBasis::new(&Sector::shells(&[(10, 9), (6, 5)]))?;
//! assert_eq!(basis.dim(), 60);
//! ```

mod basis;
mod fock;
mod sector;

pub use basis::FockBasis;
pub use fock::{binomial, FockState, MAX_ORBITALS};
pub use sector::{sz_predicate, Occupation, Sector, SectorPredicate};
