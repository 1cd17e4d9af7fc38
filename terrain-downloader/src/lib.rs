//! terrain-downloader - Bulk download of quantized-mesh terrain tiles
//!
//! This library plans and fetches the terrain tiles covering a geographic
//! rectangle across a range of zoom levels:
//!
//! - [`coord`] maps longitude/latitude onto the geographic tile grid
//! - [`planner`] turns a selection into per-level tile ranges, clipped to
//!   what the service declares as available
//! - [`provider`] exchanges the developer token and loads `layer.json`
//! - [`store`] fetches a single tile into the local store, resumably
//! - [`executor`] bounds how many tiles are in flight
//! - [`download`] drives a whole job and reports progress events

pub mod config;
pub mod coord;
pub mod download;
pub mod executor;
pub mod logging;
pub mod planner;
pub mod provider;
pub mod store;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
