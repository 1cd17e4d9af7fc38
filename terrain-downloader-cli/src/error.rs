//! CLI error handling with user-friendly messages.
//!
//! Every command returns `Result<(), CliError>`; `main` turns an error into
//! a message, optional hints and exit code 1.

use std::fmt;
use std::process;

use terrain_downloader::config::ConfigFileError;
use terrain_downloader::coord::CoordError;
use terrain_downloader::download::DownloadError;
use terrain_downloader::provider::{AuthError, ClientError, MetadataError};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read or written
    ConfigFile(ConfigFileError),
    /// Other configuration problem
    Config(String),
    /// Selection rectangle could not be parsed
    InvalidRectangle(CoordError),
    /// No developer token on the command line or in the config file
    MissingToken,
    /// HTTP client could not be built
    Client(ClientError),
    /// Download job aborted
    Download(DownloadError),
    /// Async runtime could not be started
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::MissingToken => {
                eprintln!();
                eprintln!("Pass a developer token with --token, or set it once with:");
                eprintln!("  terrain-downloader init");
                eprintln!("and fill in `token` under [service] in the config file.");
            }
            CliError::Download(DownloadError::Auth(AuthError::Unauthorized)) => {
                eprintln!();
                eprintln!("The terrain service rejected the developer token. Make sure:");
                eprintln!("  1. The token has not expired or been revoked");
                eprintln!("  2. The token has access to the terrain asset");
            }
            CliError::Download(DownloadError::Auth(AuthError::Transport(_)))
            | CliError::Download(DownloadError::Metadata(_)) => {
                eprintln!();
                eprintln!("Check your network connection. Tiles already on disk are kept;");
                eprintln!("run the same command again to resume.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::InvalidRectangle(e) => write!(f, "Invalid rectangle: {}", e),
            CliError::MissingToken => write!(f, "No developer token configured"),
            CliError::Client(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Download(e) => write!(f, "Download failed: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::InvalidRectangle(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Download(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::InvalidRectangle(e)
    }
}

impl From<ClientError> for CliError {
    fn from(e: ClientError) -> Self {
        CliError::Client(e)
    }
}

impl From<DownloadError> for CliError {
    fn from(e: DownloadError) -> Self {
        CliError::Download(e)
    }
}

impl From<MetadataError> for CliError {
    fn from(e: MetadataError) -> Self {
        CliError::Download(DownloadError::Metadata(e))
    }
}
