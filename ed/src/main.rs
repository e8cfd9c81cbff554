//! ED Calculation Command-Line Interface
//!
//! This is the main entry point for running ED calculations with YAML configuration.

use color_eyre::eyre::Result;
use ed::app::EdApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    EdApplication::from_cli()?.run()
}
