//! User configuration (`~/.terrain-downloader/config.ini`).

mod file;
mod parser;
mod writer;

pub use file::{
    config_directory, config_file_path, default_log_file, default_store_directory, ConfigFile,
    ConfigFileError, DownloadSettings, LoggingSettings, ServiceSettings, CONFIG_DIR_NAME,
};
