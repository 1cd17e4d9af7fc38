//! Terrain download jobs.
//!
//! This module ties the other components together:
//! - Job configuration (`config`)
//! - Job lifecycle states (`state`)
//! - Atomic counters and the event channel (`progress`)
//! - The top-level driver (`orchestrator`)
//!
//! # Architecture
//!
//! ```text
//! DownloadOrchestrator
//!         │
//!         ├── SessionAuth      (token exchange, cached)
//!         ├── LayerMetadata    (layer.json, cached on disk)
//!         ├── BoundsPlanner    (per-level tile ranges)
//!         ├── BoundedWorkPool  (at most N tiles in flight)
//!         │       └── TileStore::fetch_tile
//!         └── JobProgress      (counters → DownloadEvent channel)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use terrain_downloader::download::{event_channel, DownloadConfig, DownloadOrchestrator};
//! use terrain_downloader::provider::ReqwestTerrainClient;
//!
//! let config = DownloadConfig::new(token, "/data/terrain", "116,39,117,41".parse()?);
//! let mut orchestrator = DownloadOrchestrator::new(Arc::new(ReqwestTerrainClient::new()?));
//!
//! let (tx, mut rx) = event_channel();
//! let (summary, ()) = tokio::join!(orchestrator.run(&config, Some(tx)), async {
//!     while let Some(event) = rx.recv().await {
//!         println!("{:?}", event);
//!     }
//! });
//! ```

mod config;
mod error;
mod orchestrator;
mod progress;
mod state;

pub use config::{DownloadConfig, DEFAULT_CONCURRENCY};
pub use error::{DownloadError, DownloadResult};
pub use orchestrator::DownloadOrchestrator;
pub use progress::{
    event_channel, DownloadEvent, DownloadSummary, EventReceiver, EventSender, JobProgress,
};
pub use state::JobState;
