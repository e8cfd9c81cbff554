//! Input/Output operations for ED calculations
//!
//! This module handles logging setup, term files and result files.

mod output;
mod terms;

pub use output::{setup_output, write_eigenvalues, write_rixs_map, write_spectrum};
pub use terms::{read_coulomb_file, read_hopping_file};
