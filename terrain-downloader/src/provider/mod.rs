//! Terrain service access
//!
//! Everything that talks to the remote service lives here: the HTTP seam,
//! the developer-token exchange and the `layer.json` capability document.
//!
//! ```ignore
//! use terrain_downloader::provider::{ReqwestTerrainClient, SessionAuth, LayerMetadata};
//!
//! let client = Arc::new(ReqwestTerrainClient::new()?);
//! let session = SessionAuth::new(client.clone(), DEFAULT_AUTH_ENDPOINT, &store)
//!     .authenticate(&token)
//!     .await?;
//! let metadata = LayerMetadata::load(client.as_ref(), &session, &store).await?;
//! ```

mod http;
mod layer;
mod session;

pub use http::{
    BodyStream, ClientError, HttpResponse, ReqwestTerrainClient, StreamingResponse,
    TerrainHttpClient, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT,
};
pub use layer::{
    AvailableRange, LayerMetadata, MetadataError, DEFAULT_TILE_TEMPLATE, LAYER_FILE_NAME,
    TILE_EXTENSIONS_QUERY,
};
pub use session::{
    AuthError, Session, SessionAuth, AUTH_FILE_NAME, DEFAULT_AUTH_ENDPOINT, DEFAULT_REFERER,
};

#[cfg(test)]
pub use http::tests::{MockRoute, MockTerrainClient};
