//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Browser user agent sent with every request.
///
/// The terrain service serves the web viewer, so requests are made to look
/// like they come from it.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Timeout applied to requests that do not pass their own.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level failure, before any HTTP status is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The client itself could not be constructed
    #[error("failed to create HTTP client: {0}")]
    Build(String),

    /// The request or body did not finish within the timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Could not connect to the server
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other request failure
    #[error("request failed: {0}")]
    Request(String),

    /// The body stream broke after the headers arrived
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl ClientError {
    fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(e.to_string())
        } else if e.is_connect() {
            ClientError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            ClientError::Body(e.to_string())
        } else {
            ClientError::Request(e.to_string())
        }
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Chunked response body.
pub type BodyStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// A response whose body is read chunk by chunk.
pub struct StreamingResponse {
    pub status: u16,
    /// Value of the `Content-Length` header, if the server sent one
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Async HTTP operations needed to talk to the terrain service.
///
/// Non-2xx responses are returned as values, not errors; callers decide what
/// a status means. Only transport failures produce a [`ClientError`].
pub trait TerrainHttpClient: Send + Sync {
    /// GET `url` and buffer the whole body.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<HttpResponse, ClientError>> + Send;

    /// GET `url` and hand back the body as a stream.
    ///
    /// `timeout` covers connecting, headers and the entire body.
    fn get_streaming(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> impl Future<Output = Result<StreamingResponse, ClientError>> + Send;
}

/// Reqwest-backed [`TerrainHttpClient`].
#[derive(Clone)]
pub struct ReqwestTerrainClient {
    client: reqwest::Client,
}

impl ReqwestTerrainClient {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self, ClientError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client whose requests time out after `timeout` unless a
    /// request sets its own.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Build(e.to_string()))?;

        Ok(Self { client })
    }

    fn request(&self, url: &str, headers: &[(String, String)]) -> reqwest::RequestBuilder {
        headers
            .iter()
            .fold(self.client.get(url), |request, (name, value)| {
                request.header(name.as_str(), value.as_str())
            })
    }
}

impl TerrainHttpClient for ReqwestTerrainClient {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse, ClientError> {
        trace!(url = url, "HTTP GET request starting");

        let response = self.request(url, headers).send().await.map_err(|e| {
            warn!(
                url = url,
                error = %e,
                is_connect = e.is_connect(),
                is_timeout = e.is_timeout(),
                "HTTP request failed"
            );
            ClientError::from_reqwest(&e)
        })?;

        let status = response.status().as_u16();
        debug!(url = url, status = status, "HTTP response received");

        let body = response.bytes().await.map_err(|e| {
            warn!(url = url, error = %e, "Failed to read response body");
            ClientError::from_reqwest(&e)
        })?;

        Ok(HttpResponse { status, body })
    }

    async fn get_streaming(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<StreamingResponse, ClientError> {
        trace!(url = url, "HTTP streaming GET starting");

        let response = self
            .request(url, headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                debug!(url = url, error = %e, "HTTP request failed");
                ClientError::from_reqwest(&e)
            })?;

        let status = response.status().as_u16();
        let content_length = response.content_length();

        let body = stream::unfold(Some(response), |state| async move {
            let mut response = state?;
            match response.chunk().await {
                Ok(Some(chunk)) => Some((Ok(chunk), Some(response))),
                Ok(None) => None,
                // Stop after the first error.
                Err(e) => Some((Err(ClientError::from_reqwest(&e)), None)),
            }
        })
        .boxed();

        Ok(StreamingResponse {
            status,
            content_length,
            body,
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Canned answer for a mocked URL.
    #[derive(Debug, Clone)]
    pub enum MockRoute {
        /// Status plus a body delivered in one piece
        Body(u16, Bytes),
        /// Status, optional content length and a scripted chunk sequence
        Chunks {
            status: u16,
            content_length: Option<u64>,
            chunks: Vec<Result<Bytes, ClientError>>,
        },
        /// Transport failure before any response
        Fail(ClientError),
    }

    impl MockRoute {
        pub fn ok(body: impl Into<Bytes>) -> Self {
            MockRoute::Body(200, body.into())
        }

        pub fn status(status: u16) -> Self {
            MockRoute::Body(status, Bytes::new())
        }
    }

    /// Mock async HTTP client for testing.
    ///
    /// Routes match when the requested URL contains the route pattern; the
    /// first match wins and unmatched URLs answer 404. Every request URL and
    /// its headers are recorded.
    #[derive(Clone, Default)]
    pub struct MockTerrainClient {
        routes: Arc<Mutex<Vec<(String, MockRoute)>>>,
        requests: Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>,
    }

    impl MockTerrainClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(self, pattern: impl Into<String>, route: MockRoute) -> Self {
            self.routes.lock().unwrap().push((pattern.into(), route));
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|(url, _)| url.clone())
                .collect()
        }

        pub fn request_headers(&self, index: usize) -> Vec<(String, String)> {
            self.requests.lock().unwrap()[index].1.clone()
        }

        fn lookup(&self, url: &str, headers: &[(String, String)]) -> MockRoute {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), headers.to_vec()));
            self.routes
                .lock()
                .unwrap()
                .iter()
                .find(|(pattern, _)| url.contains(pattern.as_str()))
                .map(|(_, route)| route.clone())
                .unwrap_or_else(|| MockRoute::status(404))
        }
    }

    impl TerrainHttpClient for MockTerrainClient {
        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> Result<HttpResponse, ClientError> {
            match self.lookup(url, headers) {
                MockRoute::Body(status, body) => Ok(HttpResponse { status, body }),
                MockRoute::Chunks { status, chunks, .. } => {
                    let mut body = Vec::new();
                    for chunk in chunks {
                        body.extend_from_slice(&chunk?);
                    }
                    Ok(HttpResponse {
                        status,
                        body: body.into(),
                    })
                }
                MockRoute::Fail(e) => Err(e),
            }
        }

        async fn get_streaming(
            &self,
            url: &str,
            headers: &[(String, String)],
            _timeout: Duration,
        ) -> Result<StreamingResponse, ClientError> {
            match self.lookup(url, headers) {
                MockRoute::Body(status, body) => Ok(StreamingResponse {
                    status,
                    content_length: Some(body.len() as u64),
                    body: stream::iter(vec![Ok(body)]).boxed(),
                }),
                MockRoute::Chunks {
                    status,
                    content_length,
                    chunks,
                } => Ok(StreamingResponse {
                    status,
                    content_length,
                    body: stream::iter(chunks).boxed(),
                }),
                MockRoute::Fail(e) => Err(e),
            }
        }
    }

    #[tokio::test]
    async fn test_mock_routes_by_substring() {
        let mock = MockTerrainClient::new()
            .route("layer.json", MockRoute::ok("{}"))
            .route("endpoint", MockRoute::status(401));

        let layer = mock.get("https://x/layer.json", &[]).await.unwrap();
        assert_eq!(layer.status, 200);
        assert_eq!(&layer.body[..], b"{}");

        let auth = mock.get("https://x/endpoint?t=1", &[]).await.unwrap();
        assert_eq!(auth.status, 401);
        assert!(!auth.is_success());

        let missing = mock.get("https://x/other", &[]).await.unwrap();
        assert_eq!(missing.status, 404);

        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_streaming_yields_chunks_in_order() {
        let mock = MockTerrainClient::new().route(
            "tile",
            MockRoute::Chunks {
                status: 200,
                content_length: None,
                chunks: vec![Ok(Bytes::from_static(b"ab")), Ok(Bytes::from_static(b"cd"))],
            },
        );

        let response = mock
            .get_streaming("tile", &[], DEFAULT_REQUEST_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(response.content_length, None);

        let chunks: Vec<_> = response.body.collect().await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].as_ref().unwrap(), &Bytes::from_static(b"cd"));
    }

    #[tokio::test]
    async fn test_mock_transport_failure() {
        let mock = MockTerrainClient::new()
            .route("tile", MockRoute::Fail(ClientError::Timeout("slow".into())));
        let result = mock.get("tile", &[]).await;
        assert!(matches!(result, Err(ClientError::Timeout(_))));
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestTerrainClient::new().is_ok());
    }

    #[test]
    fn test_client_error_messages() {
        assert_eq!(
            ClientError::Timeout("30s".into()).to_string(),
            "request timed out: 30s"
        );
        assert!(ClientError::Connect("refused".into())
            .to_string()
            .contains("connection failed"));
    }
}
