//! Advisory per-path claims for tiles being written.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use dashmap::DashSet;

/// Set of tile paths currently being fetched.
///
/// Cloning shares the same set. Jobs that may write into the same store
/// should share one registry, normally [`InFlightTiles::global`].
#[derive(Debug, Clone, Default)]
pub struct InFlightTiles {
    paths: Arc<DashSet<PathBuf>>,
}

impl InFlightTiles {
    /// Creates an empty, unshared registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Self {
        static GLOBAL: OnceLock<InFlightTiles> = OnceLock::new();
        GLOBAL.get_or_init(InFlightTiles::new).clone()
    }

    /// Claims `path`, or returns `None` if someone else holds it.
    pub fn try_claim(&self, path: &Path) -> Option<TileClaim> {
        let path = path.to_path_buf();
        if self.paths.insert(path.clone()) {
            Some(TileClaim {
                paths: Arc::clone(&self.paths),
                path,
            })
        } else {
            None
        }
    }

    pub fn is_claimed(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Held while a tile path is being worked on; releases it on drop.
#[derive(Debug)]
pub struct TileClaim {
    paths: Arc<DashSet<PathBuf>>,
    path: PathBuf,
}

impl TileClaim {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TileClaim {
    fn drop(&mut self) {
        self.paths.remove(&self.path);
    }
}
