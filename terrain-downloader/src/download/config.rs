//! Configuration for a download job.

use std::path::PathBuf;
use std::time::Duration;

use crate::coord::GeographicRectangle;
use crate::planner::{
    estimate_storage, BoundsPlanner, LevelPlan, StorageEstimate, ZoomRange, DEFAULT_MAX_ZOOM,
    DEFAULT_MIN_ZOOM,
};
use crate::provider::{
    LayerMetadata, MetadataError, DEFAULT_AUTH_ENDPOINT, DEFAULT_REQUEST_TIMEOUT,
};

/// Default number of tiles fetched at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Configuration for one download job.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadConfig {
    /// Developer token exchanged for an access token.
    pub dev_token: String,

    /// Root of the local tile store.
    pub store_dir: PathBuf,

    /// Region to download. Levels below 4 ignore it and cover the globe.
    pub selection: GeographicRectangle,

    /// Maximum tiles in flight. Never below one.
    pub concurrency: usize,

    /// Timeout for a single tile, body included.
    pub tile_timeout: Duration,

    /// Token exchange endpoint.
    pub auth_endpoint: String,

    /// Caps the highest planned level.
    pub max_zoom: Option<u32>,
}

impl DownloadConfig {
    /// Create a configuration with default tuning.
    pub fn new(
        dev_token: impl Into<String>,
        store_dir: impl Into<PathBuf>,
        selection: GeographicRectangle,
    ) -> Self {
        Self {
            dev_token: dev_token.into(),
            store_dir: store_dir.into(),
            selection,
            concurrency: DEFAULT_CONCURRENCY,
            tile_timeout: DEFAULT_REQUEST_TIMEOUT,
            auth_endpoint: DEFAULT_AUTH_ENDPOINT.to_string(),
            max_zoom: None,
        }
    }

    /// Set the concurrency limit; zero is raised to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-tile timeout.
    pub fn with_tile_timeout(mut self, timeout: Duration) -> Self {
        self.tile_timeout = timeout;
        self
    }

    /// Set the token exchange endpoint.
    pub fn with_auth_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.auth_endpoint = endpoint.into();
        self
    }

    /// Cap the highest planned level.
    pub fn with_max_zoom(mut self, max_zoom: u32) -> Self {
        self.max_zoom = Some(max_zoom);
        self
    }

    /// The per-level tile plan of this job.
    ///
    /// With metadata, its zoom bounds and availability table apply; without,
    /// the default zoom range is planned unclipped.
    pub fn plan(&self, metadata: Option<&LayerMetadata>) -> Vec<LevelPlan> {
        let zoom = ZoomRange::new(
            metadata
                .and_then(LayerMetadata::min_zoom)
                .unwrap_or(DEFAULT_MIN_ZOOM),
            metadata
                .and_then(LayerMetadata::max_zoom)
                .unwrap_or(DEFAULT_MAX_ZOOM),
        )
        .capped(self.max_zoom);
        let availability = metadata.and_then(LayerMetadata::availability);

        BoundsPlanner::default().plan(&self.selection, zoom, availability.as_ref())
    }

    /// Expected disk usage of this job, without network access.
    ///
    /// Plans with the `layer.json` cached in the store when there is one, so
    /// the count matches what a download over the same store fetches.
    pub fn estimate_storage(&self) -> Result<StorageEstimate, MetadataError> {
        let metadata = LayerMetadata::load_cached(&self.store_dir)?;
        Ok(estimate_storage(&self.plan(metadata.as_ref())))
    }
}
