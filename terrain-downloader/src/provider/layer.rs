//! The service capability document (`layer.json`).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::http::{ClientError, TerrainHttpClient};
use super::session::{persist_best_effort, Session};
use crate::coord::{TileIndex, MAX_LEVEL};
use crate::planner::{AvailabilityTable, TileBoundsRange};

/// Name of the capability document, both remote and in the store.
pub const LAYER_FILE_NAME: &str = "layer.json";

/// Query suffix requesting vertex normals and per-tile metadata.
pub const TILE_EXTENSIONS_QUERY: &str = "&extensions=octvertexnormals-metadata";

/// Template used when a document lists none.
pub const DEFAULT_TILE_TEMPLATE: &str = "{z}/{x}/{y}.terrain?v={version}";

/// Capability document failures.
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    /// The service could not be reached
    #[error("could not fetch layer.json: {0}")]
    Transport(#[from] ClientError),

    /// Non-200 status or a document that does not parse
    #[error("unexpected layer.json: {0}")]
    Unexpected(String),
}

/// One availability rectangle as written in `layer.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableRange {
    pub start_x: u32,
    pub start_y: u32,
    pub end_x: u32,
    pub end_y: u32,
}

/// Parsed `layer.json`.
///
/// Every field is optional. Missing zoom bounds fall back to the planner
/// defaults and missing templates to [`DEFAULT_TILE_TEMPLATE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub tiles: Vec<String>,
    #[serde(default)]
    pub minzoom: Option<u32>,
    #[serde(default)]
    pub maxzoom: Option<u32>,
    #[serde(default)]
    pub available: Option<Vec<Vec<AvailableRange>>>,
    #[serde(default)]
    pub projection: Option<String>,
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub bounds: Option<[f64; 4]>,
}

impl LayerMetadata {
    /// Loads the document from the store, fetching it once if absent.
    ///
    /// A cached copy is trusted forever. A cached copy that does not parse is
    /// an error rather than a reason to refetch.
    pub async fn load<C: TerrainHttpClient>(
        client: &C,
        session: &Session,
        store_dir: &Path,
    ) -> Result<Self, MetadataError> {
        let path = store_dir.join(LAYER_FILE_NAME);

        match tokio::fs::read(&path).await {
            Ok(cached) => {
                debug!(path = %path.display(), "Using cached layer.json");
                return Self::from_slice(&cached);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(MetadataError::Unexpected(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        let url = format!("{}{}", session.base_url(), LAYER_FILE_NAME);
        let response = client.get(&url, session.auth_headers()).await?;
        if response.status != 200 {
            return Err(MetadataError::Unexpected(format!(
                "HTTP {} from {}",
                response.status, url
            )));
        }

        let metadata = Self::from_slice(&response.body)?;
        persist_best_effort(&path, &response.body).await;

        info!(
            version = %metadata.version,
            levels = metadata.available.as_ref().map_or(0, Vec::len),
            "Loaded layer.json"
        );
        Ok(metadata)
    }

    /// Parses a document.
    ///
    /// Zoom bounds deeper than [`MAX_LEVEL`] are rejected.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MetadataError> {
        let metadata: Self = serde_json::from_slice(bytes)
            .map_err(|e| MetadataError::Unexpected(format!("malformed layer.json: {}", e)))?;

        for (key, zoom) in [("minzoom", metadata.minzoom), ("maxzoom", metadata.maxzoom)] {
            if let Some(zoom) = zoom.filter(|z| *z > MAX_LEVEL) {
                return Err(MetadataError::Unexpected(format!(
                    "{} {} is deeper than level {}",
                    key, zoom, MAX_LEVEL
                )));
            }
        }
        Ok(metadata)
    }

    /// The document cached in `store_dir`, if one has been saved there.
    ///
    /// Never touches the network.
    pub fn load_cached(store_dir: &Path) -> Result<Option<Self>, MetadataError> {
        let path = store_dir.join(LAYER_FILE_NAME);
        match std::fs::read(&path) {
            Ok(bytes) => Self::from_slice(&bytes).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MetadataError::Unexpected(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn min_zoom(&self) -> Option<u32> {
        self.minzoom
    }

    pub fn max_zoom(&self) -> Option<u32> {
        self.maxzoom
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The per-level availability table, if the document declares one.
    ///
    /// Rectangles whose start lies past their end are dropped.
    pub fn availability(&self) -> Option<AvailabilityTable> {
        let levels = self.available.as_ref()?;
        Some(AvailabilityTable::new(
            levels
                .iter()
                .map(|ranges| {
                    ranges
                        .iter()
                        .filter_map(|r| {
                            TileBoundsRange::new(r.start_x, r.start_y, r.end_x, r.end_y)
                        })
                        .collect()
                })
                .collect(),
        ))
    }

    /// Full download URL of one tile under `base_url`.
    ///
    /// Uses the first template only.
    pub fn tile_url(&self, base_url: &str, tile: TileIndex) -> String {
        let template = self
            .tiles
            .first()
            .map_or(DEFAULT_TILE_TEMPLATE, String::as_str);
        let path = template
            .replace("{z}", &tile.level.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
            .replace("{version}", &self.version);
        format!("{}{}{}", base_url, path, TILE_EXTENSIONS_QUERY)
    }
}
