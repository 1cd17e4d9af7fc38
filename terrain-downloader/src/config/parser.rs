//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::file::{ConfigFile, ConfigFileError};

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [service] section
    if let Some(section) = ini.section(Some("service")) {
        if let Some(v) = section.get("token") {
            let v = v.trim();
            if !v.is_empty() {
                config.service.token = Some(v.to_string());
            }
        }
        if let Some(v) = section.get("auth_endpoint") {
            let v = v.trim();
            if !v.is_empty() {
                if !v.starts_with("http://") && !v.starts_with("https://") {
                    return Err(ConfigFileError::InvalidValue {
                        section: "service".to_string(),
                        key: "auth_endpoint".to_string(),
                        value: v.to_string(),
                        reason: "must be an http:// or https:// URL".to_string(),
                    });
                }
                config.service.auth_endpoint = v.to_string();
            }
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.download.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("concurrency") {
            config.download.concurrency = parse_positive(v).ok_or_else(|| {
                ConfigFileError::InvalidValue {
                    section: "download".to_string(),
                    key: "concurrency".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer".to_string(),
                }
            })?;
        }
        if let Some(v) = section.get("timeout") {
            config.download.timeout = parse_positive(v)
                .map(|secs| secs as u64)
                .ok_or_else(|| ConfigFileError::InvalidValue {
                    section: "download".to_string(),
                    key: "timeout".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer (seconds)".to_string(),
                })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn parse_positive(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
