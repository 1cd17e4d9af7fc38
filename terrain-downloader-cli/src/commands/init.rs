//! Init command - write a starter configuration file.

use std::path::Path;

use terrain_downloader::config::ConfigFile;

use super::common::display_path;
use crate::error::CliError;

/// What `run` did with the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    Overwritten,
    AlreadyExists,
}

/// Run the init command.
pub fn run(path: &Path, force: bool) -> Result<(), CliError> {
    let outcome = write_config(path, force)?;

    match outcome {
        InitOutcome::AlreadyExists => {
            println!("Configuration file already exists: {}", display_path(path));
            println!("Use --force to replace it with the defaults.");
        }
        InitOutcome::Created | InitOutcome::Overwritten => {
            println!("Configuration file: {}", display_path(path));
            println!();
            println!("Set `token` under [service] to your developer token.");
            println!("CLI arguments override config file values when specified.");
        }
    }
    Ok(())
}

/// Saves the default configuration unless a file exists and `force` is off.
pub fn write_config(path: &Path, force: bool) -> Result<InitOutcome, CliError> {
    let existed = path.exists();
    if existed && !force {
        return Ok(InitOutcome::AlreadyExists);
    }

    ConfigFile::default().save_to(path)?;
    Ok(if existed {
        InitOutcome::Overwritten
    } else {
        InitOutcome::Created
    })
}
