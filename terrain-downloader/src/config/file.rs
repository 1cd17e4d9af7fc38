//! Configuration file handling for ~/.terrain-downloader/config.ini.
//!
//! Loads and saves user configuration with sensible defaults. Parsing lives
//! in [`super::parser`] and serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::download::DEFAULT_CONCURRENCY;
use crate::provider::{DEFAULT_AUTH_ENDPOINT, DEFAULT_REQUEST_TIMEOUT};

/// Name of the directory under the home directory holding all state.
pub const CONFIG_DIR_NAME: &str = ".terrain-downloader";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// `[service]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Developer token; may also be given on the command line.
    pub token: Option<String>,
    pub auth_endpoint: String,
}

/// `[download]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Local tile store.
    pub directory: PathBuf,
    /// Tiles fetched at once.
    pub concurrency: usize,
    /// Per-tile timeout in seconds.
    pub timeout: u64,
}

/// `[logging]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

/// Contents of `config.ini`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub service: ServiceSettings,
    pub download: DownloadSettings,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            service: ServiceSettings {
                token: None,
                auth_endpoint: DEFAULT_AUTH_ENDPOINT.to_string(),
            },
            download: DownloadSettings {
                directory: default_store_directory(),
                concurrency: DEFAULT_CONCURRENCY,
                timeout: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}

impl ConfigFile {
    /// Load configuration from the default path (~/.terrain-downloader/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }
}

/// Get the path to the config directory (~/.terrain-downloader).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Get the path to the config file (~/.terrain-downloader/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Default tile store (~/.terrain-downloader/terrain).
pub fn default_store_directory() -> PathBuf {
    config_directory().join("terrain")
}

/// Default log file (~/.terrain-downloader/terrain-downloader.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join("terrain-downloader.log")
}
