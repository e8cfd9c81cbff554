//! Driver for exact diagonalization and XAS/RIXS spectra
//!
//! Reads a YAML configuration, builds the sectors and operators with
//! [`fock`], runs the selected solver and writes the results.

pub mod app;
pub mod config;
pub mod io;
