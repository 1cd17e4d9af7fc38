//! Task execution
//!
//! Tile fetches are driven by a [`BoundedWorkPool`]: a single task polling a
//! `FuturesUnordered` that never holds more than `limit` handlers. Handlers
//! borrow from the caller, so there is no spawning and no `'static` bound.
//!
//! ```ignore
//! use terrain_downloader::executor::BoundedWorkPool;
//!
//! BoundedWorkPool::new(8)
//!     .run(tiles, |tile| async move { store.fetch_tile(tile).await; })
//!     .await;
//! ```

mod pool;

pub use pool::BoundedWorkPool;
