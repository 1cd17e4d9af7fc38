//! CLI runner for common setup.
//!
//! Loads the configuration file and initializes logging once per process,
//! so command handlers start from a ready environment.

use std::path::Path;

use tracing::info;

use terrain_downloader::config::ConfigFile;
use terrain_downloader::logging::{init_logging, LoggingGuard, LoggingOptions};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load the config file (default location unless `config_path` is given)
    /// and start logging to the file it names.
    ///
    /// Log lines are mirrored to stderr only when stderr is not a terminal,
    /// so they never tear through the progress bar.
    pub fn new(config_path: Option<&Path>, verbose: bool) -> Result<Self, CliError> {
        let config = load_config(config_path)?;

        let options = LoggingOptions::new(&config.logging.file)
            .with_verbose(verbose)
            .with_stderr(!console::user_attended_stderr());
        let logging_guard =
            init_logging(&options).map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("terrain-downloader v{}", terrain_downloader::VERSION);
        info!("terrain-downloader CLI: {} command", command);
    }
}

/// Reads `config_path`, or the default config file when none is given.
pub fn load_config(config_path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match config_path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}
