//! Local tile store
//!
//! Tiles live at `{store}/{level}/{x}/{y}.terrain`. A tile whose file already
//! exists is never fetched again, so a file on disk must always be complete:
//! bodies are streamed straight to the final path and the file is removed if
//! anything goes wrong before the last chunk is written.

mod error;
mod lock;

pub use error::TileFetchError;
pub use lock::{InFlightTiles, TileClaim};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use crate::coord::TileIndex;
use crate::provider::{LayerMetadata, Session, TerrainHttpClient, DEFAULT_REQUEST_TIMEOUT};

/// Extension of stored tile files.
pub const TILE_FILE_EXTENSION: &str = "terrain";

/// Path of a tile under `root`.
pub fn tile_path(root: &Path, tile: TileIndex) -> PathBuf {
    root.join(tile.level.to_string())
        .join(tile.x.to_string())
        .join(format!("{}.{}", tile.y, TILE_FILE_EXTENSION))
}

/// Where a successful tile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSource {
    /// Already on disk; no request was made
    Cached,
    /// Fetched and written by this call
    Downloaded,
    /// Another job is writing the same path right now
    InFlightElsewhere,
}

/// Outcome of a successful [`TileStore::fetch_tile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileResult {
    pub tile: TileIndex,
    /// File size for cached tiles; the server-reported length otherwise
    pub bytes: u64,
    pub source: TileSource,
}

/// Fetch-or-skip access to the tile directory.
pub struct TileStore<C> {
    root: PathBuf,
    client: Arc<C>,
    session: Session,
    metadata: Arc<LayerMetadata>,
    timeout: Duration,
    in_flight: InFlightTiles,
}

impl<C: TerrainHttpClient> TileStore<C> {
    /// Creates a store using the process-wide in-flight registry.
    pub fn new(
        root: impl Into<PathBuf>,
        client: Arc<C>,
        session: Session,
        metadata: Arc<LayerMetadata>,
    ) -> Self {
        Self {
            root: root.into(),
            client,
            session,
            metadata,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            in_flight: InFlightTiles::global(),
        }
    }

    /// Sets the per-tile timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Uses a specific in-flight registry instead of the global one.
    pub fn with_in_flight(mut self, in_flight: InFlightTiles) -> Self {
        self.in_flight = in_flight;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, tile: TileIndex) -> PathBuf {
        tile_path(&self.root, tile)
    }

    /// Makes sure `tile` is on disk.
    ///
    /// Existing files are reported without touching the network. Otherwise
    /// the tile is streamed to disk; on any failure the partial file is
    /// removed before the error is returned.
    pub async fn fetch_tile(&self, tile: TileIndex) -> Result<TileResult, TileFetchError> {
        let path = self.path(tile);

        let Some(_claim) = self.in_flight.try_claim(&path) else {
            debug!(level = tile.level, x = tile.x, y = tile.y, "Tile in flight elsewhere");
            return Ok(TileResult {
                tile,
                bytes: 0,
                source: TileSource::InFlightElsewhere,
            });
        };

        if let Ok(meta) = tokio::fs::metadata(&path).await {
            trace!(level = tile.level, x = tile.x, y = tile.y, "Tile already stored");
            return Ok(TileResult {
                tile,
                bytes: meta.len(),
                source: TileSource::Cached,
            });
        }

        let url = self.metadata.tile_url(self.session.base_url(), tile);
        debug!(level = tile.level, x = tile.x, y = tile.y, "Downloading tile");

        let response = self
            .client
            .get_streaming(&url, self.session.auth_headers(), self.timeout)
            .await?;

        if response.status != 200 {
            return Err(TileFetchError::HttpStatus(response.status));
        }

        let write_failure = |source| TileFetchError::WriteFailure {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(write_failure)?;
        }

        let mut partial = PartialFile::new(path.clone());
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(write_failure)?;

        let mut written: u64 = 0;
        let mut body = response.body;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(write_failure)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_failure)?;
        drop(file);
        partial.keep();

        debug!(
            level = tile.level,
            x = tile.x,
            y = tile.y,
            bytes = written,
            "Tile stored"
        );

        Ok(TileResult {
            tile,
            bytes: response.content_length.unwrap_or(written),
            source: TileSource::Downloaded,
        })
    }
}

/// Removes a file on drop unless it was kept.
///
/// Covers early returns and a fetch future dropped mid-write.
struct PartialFile {
    path: PathBuf,
    keep: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed partial tile"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove partial tile"
            ),
        }
    }
}
