//! Error types for single-tile fetches.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::provider::ClientError;

/// Why one tile could not be stored.
///
/// Whatever the variant, no partial file is left behind.
#[derive(Debug, Error)]
pub enum TileFetchError {
    /// Connect failure, timeout or broken body stream
    #[error("transport error: {0}")]
    Transport(#[from] ClientError),

    /// The server answered with something other than 200
    #[error("server returned HTTP {0}")]
    HttpStatus(u16),

    /// The tile file or its directories could not be written
    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
