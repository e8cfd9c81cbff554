//! X-ray absorption and RIXS spectra
//!
//! Both spectra start from thermally weighted eigenstates of the ground
//! sector. XAS is the spectral function of the intermediate Hamiltonian seen
//! from `T|g⟩`; RIXS first propagates `T_abs|g⟩` with the core-hole resolvent
//! and then takes the spectral function of the final Hamiltonian seen from
//! `T_emi (z - H_n)⁻¹ T_abs|g⟩`.

mod rixs;
mod thermal;
mod xas;
mod tests;

pub use rixs::{rixs, RixsConfig, RixsMap};
pub use thermal::{boltzmann_weights, linspace, BOLTZMANN_EV};
pub use xas::{xas, XasConfig, XasSpectrum};
