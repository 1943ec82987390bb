//! Configuration file scaffolding

use std::path::PathBuf;

use crate::cli::error::CliError;
use crate::config::sample_config;

/// Init command arguments
#[derive(Debug, Clone)]
pub struct InitArgs {
    /// Where to write the configuration file
    pub config: PathBuf,
    /// Overwrite an existing file
    pub force: bool,
}

/// Write a sample configuration file
pub fn handle_init(args: &InitArgs) -> Result<(), CliError> {
    if args.config.exists() && !args.force {
        return Err(CliError::FileExists(args.config.clone()));
    }

    std::fs::write(&args.config, sample_config())
        .map_err(|e| CliError::FileWriteError(args.config.clone(), e.to_string()))?;

    println!("Wrote {}", args.config.display());
    Ok(())
}
