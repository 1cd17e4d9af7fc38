//! Token exchange with the terrain service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::http::{ClientError, TerrainHttpClient, DEFAULT_USER_AGENT};

/// Endpoint that exchanges a developer token for an asset access token.
pub const DEFAULT_AUTH_ENDPOINT: &str = "https://api.cesium.com/v1/assets/1/endpoint";

/// Referer the web viewer sends; the service expects one.
pub const DEFAULT_REFERER: &str = "http://127.0.0.1:8080/terrain.html";

/// File the raw exchange response is written to, inside the store directory.
pub const AUTH_FILE_NAME: &str = "auth.json";

const TERRAIN_ASSET_TYPE: &str = "TERRAIN";

/// Token exchange failures.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The service rejected the developer token
    #[error("developer token was rejected by the terrain service")]
    Unauthorized,

    /// The service could not be reached
    #[error("could not reach the terrain service: {0}")]
    Transport(#[from] ClientError),

    /// Any other status, a malformed body or a non-terrain asset
    #[error("unexpected authentication response: {0}")]
    Unexpected(String),
}

/// Credentials for talking to the terrain service.
///
/// Produced by [`SessionAuth::authenticate`] and passed explicitly to every
/// component that needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    base_url: String,
    access_token: String,
    auth_headers: Vec<(String, String)>,
}

impl Session {
    /// Builds a session and its request headers from an access token.
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        let access_token = access_token.into();
        let auth_headers = vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", access_token),
            ),
            ("Referer".to_string(), DEFAULT_REFERER.to_string()),
            ("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string()),
        ];

        Self {
            base_url: base_url.into(),
            access_token,
            auth_headers,
        }
    }

    /// Service root, ending in `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Headers to attach to metadata and tile requests.
    pub fn auth_headers(&self) -> &[(String, String)] {
        &self.auth_headers
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointResponse {
    #[serde(rename = "type")]
    asset_type: String,
    url: String,
    access_token: String,
}

/// Performs the developer-token exchange.
pub struct SessionAuth<C> {
    client: Arc<C>,
    endpoint: String,
    store_dir: PathBuf,
}

impl<C: TerrainHttpClient> SessionAuth<C> {
    pub fn new(client: Arc<C>, endpoint: impl Into<String>, store_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            store_dir: store_dir.into(),
        }
    }

    /// Exchanges `dev_token` for a [`Session`].
    ///
    /// The raw response body is saved to `auth.json` in the store directory;
    /// a failure to save is logged and ignored. No retries.
    pub async fn authenticate(&self, dev_token: &str) -> Result<Session, AuthError> {
        let url = format!("{}?access_token={}", self.endpoint, dev_token);
        debug!(endpoint = %self.endpoint, "Exchanging developer token");

        let response = self.client.get(&url, &[]).await?;

        match response.status {
            200 => {}
            401 => return Err(AuthError::Unauthorized),
            status => {
                return Err(AuthError::Unexpected(format!("HTTP {}", status)));
            }
        }

        let parsed: EndpointResponse = serde_json::from_slice(&response.body)
            .map_err(|e| AuthError::Unexpected(format!("malformed body: {}", e)))?;

        if parsed.asset_type != TERRAIN_ASSET_TYPE {
            return Err(AuthError::Unexpected(format!(
                "asset type is '{}', expected '{}'",
                parsed.asset_type, TERRAIN_ASSET_TYPE
            )));
        }

        persist_best_effort(&self.store_dir.join(AUTH_FILE_NAME), &response.body).await;

        info!(base_url = %parsed.url, "Authenticated with terrain service");
        Ok(Session::new(parsed.url, parsed.access_token))
    }
}

/// Writes `body` to `path`, creating parent directories. Failures only warn.
pub(crate) async fn persist_best_effort(path: &Path, body: &[u8]) {
    if let Err(e) = write_file(path, body).await {
        warn!(path = %path.display(), error = %e, "Failed to save response");
    }
}

pub(crate) async fn write_file(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::tests::{MockRoute, MockTerrainClient};
    use tempfile::TempDir;

    const OK_BODY: &str = r#"{"type":"TERRAIN","url":"https://assets.example.com/1/","accessToken":"abc123","attributions":[]}"#;

    fn auth(client: MockTerrainClient, dir: &TempDir) -> SessionAuth<MockTerrainClient> {
        SessionAuth::new(Arc::new(client), DEFAULT_AUTH_ENDPOINT, dir.path())
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let dir = TempDir::new().unwrap();
        let client = MockTerrainClient::new().route("endpoint", MockRoute::ok(OK_BODY));
        let session = auth(client.clone(), &dir)
            .authenticate("dev-token")
            .await
            .unwrap();

        assert_eq!(session.base_url(), "https://assets.example.com/1/");
        assert_eq!(session.access_token(), "abc123");
        assert_eq!(
            client.requests(),
            vec![format!("{}?access_token=dev-token", DEFAULT_AUTH_ENDPOINT)]
        );

        let saved = std::fs::read_to_string(dir.path().join(AUTH_FILE_NAME)).unwrap();
        assert_eq!(saved, OK_BODY);
    }

    #[test]
    fn test_session_headers() {
        let session = Session::new("https://x/", "tok");
        let headers = session.auth_headers();
        assert!(headers.contains(&("Authorization".to_string(), "Bearer tok".to_string())));
        assert!(headers.iter().any(|(k, _)| k == "Referer"));
        assert!(headers.iter().any(|(k, _)| k == "User-Agent"));
    }

    #[tokio::test]
    async fn test_authenticate_unauthorized() {
        let dir = TempDir::new().unwrap();
        let client = MockTerrainClient::new().route("endpoint", MockRoute::status(401));
        let result = auth(client, &dir).authenticate("bad").await;
        assert!(matches!(result, Err(AuthError::Unauthorized)));
        assert!(!dir.path().join(AUTH_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_authenticate_wrong_asset_type() {
        let dir = TempDir::new().unwrap();
        let body = r#"{"type":"IMAGERY","url":"https://x/","accessToken":"t"}"#;
        let client = MockTerrainClient::new().route("endpoint", MockRoute::ok(body));
        let result = auth(client, &dir).authenticate("tok").await;
        assert!(matches!(result, Err(AuthError::Unexpected(_))));
    }

    #[tokio::test]
    async fn test_authenticate_malformed_body() {
        let dir = TempDir::new().unwrap();
        let client = MockTerrainClient::new().route("endpoint", MockRoute::ok("not json"));
        let result = auth(client, &dir).authenticate("tok").await;
        assert!(matches!(result, Err(AuthError::Unexpected(_))));
    }

    #[tokio::test]
    async fn test_authenticate_server_error() {
        let dir = TempDir::new().unwrap();
        let client = MockTerrainClient::new().route("endpoint", MockRoute::status(503));
        let result = auth(client, &dir).authenticate("tok").await;
        assert!(matches!(result, Err(AuthError::Unexpected(msg)) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_authenticate_transport_failure() {
        let dir = TempDir::new().unwrap();
        let client = MockTerrainClient::new().route(
            "endpoint",
            MockRoute::Fail(ClientError::Connect("refused".into())),
        );
        let result = auth(client, &dir).authenticate("tok").await;
        assert!(matches!(result, Err(AuthError::Transport(_))));
    }

    #[tokio::test]
    async fn test_unwritable_store_does_not_fail_auth() {
        let dir = TempDir::new().unwrap();
        // A regular file where the store directory should be.
        let blocker = dir.path().join("store");
        std::fs::write(&blocker, b"").unwrap();

        let client = MockTerrainClient::new().route("endpoint", MockRoute::ok(OK_BODY));
        let session = SessionAuth::new(Arc::new(client), DEFAULT_AUTH_ENDPOINT, &blocker)
            .authenticate("tok")
            .await;
        assert!(session.is_ok());
    }
}
