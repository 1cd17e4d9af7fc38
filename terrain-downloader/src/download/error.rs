//! Errors that abort a whole download job.

use thiserror::Error;

use crate::provider::{AuthError, MetadataError};

/// Result type for orchestrator operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Fatal job errors. Per-tile failures are counted, not returned.
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("could not load layer metadata: {0}")]
    Metadata(#[from] MetadataError),
}
