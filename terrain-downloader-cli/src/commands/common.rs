//! Arguments and helpers shared across CLI commands.

use std::path::{Path, PathBuf};

use clap::Args;

use terrain_downloader::config::ConfigFile;
use terrain_downloader::coord::GeographicRectangle;
use terrain_downloader::download::DownloadConfig;

use crate::error::CliError;

/// Region and depth of a job.
#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
    /// Region as "west,south,east,north" in degrees (default: whole globe)
    #[arg(long = "rect", allow_hyphen_values = true, value_name = "W,S,E,N")]
    pub rectangle: Option<GeographicRectangle>,

    /// Highest zoom level to include
    #[arg(long)]
    pub max_zoom: Option<u32>,
}

impl SelectionArgs {
    /// The selected region, or the whole globe.
    pub fn selection(&self) -> GeographicRectangle {
        self.rectangle.unwrap_or(GeographicRectangle::GLOBAL)
    }
}

/// Selection plus the store whose cached `layer.json` shapes the plan.
#[derive(Debug, Clone, Args)]
pub struct PlanningArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Store directory to read a cached layer.json from (overrides config)
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

/// Store directory: CLI takes precedence, then config.
pub fn resolve_store_dir(cli_dir: Option<PathBuf>, config: &ConfigFile) -> PathBuf {
    cli_dir.unwrap_or_else(|| config.download.directory.clone())
}

/// Developer token: CLI takes precedence, then config. Blank counts as missing.
pub fn resolve_token(cli_token: Option<String>, config: &ConfigFile) -> Result<String, CliError> {
    cli_token
        .or_else(|| config.service.token.clone())
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(CliError::MissingToken)
}

/// A job configuration for commands that only plan and never authenticate.
pub fn planning_config(
    selection: &SelectionArgs,
    store_dir: PathBuf,
    config: &ConfigFile,
) -> DownloadConfig {
    let job = DownloadConfig::new("", store_dir, selection.selection())
        .with_auth_endpoint(config.service.auth_endpoint.clone());
    match selection.max_zoom {
        Some(max_zoom) => job.with_max_zoom(max_zoom),
        None => job,
    }
}

/// Human-readable byte count (binary units).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Path with the home directory shortened to `~`.
pub fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
    }
}
