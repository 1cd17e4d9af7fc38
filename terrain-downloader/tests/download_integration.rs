//! Integration tests for complete download jobs.
//!
//! These tests drive the orchestrator end to end against an in-process fake
//! terrain service:
//! - token exchange → layer.json → plan → bounded tile fetches
//! - resumability across orchestrators
//! - partial-write cleanup and recovery on the next run
//!
//! Run with: `cargo test --test download_integration`

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tempfile::TempDir;

use terrain_downloader::coord::GeographicRectangle;
use terrain_downloader::download::{
    event_channel, DownloadConfig, DownloadEvent, DownloadOrchestrator, EventReceiver, JobState,
};
use terrain_downloader::planner::total_tiles;
use terrain_downloader::provider::{
    ClientError, HttpResponse, StreamingResponse, TerrainHttpClient,
};
use terrain_downloader::store::InFlightTiles;

// ============================================================================
// Fake terrain service
// ============================================================================

const AUTH_BODY: &str =
    r#"{"type":"TERRAIN","url":"https://assets.example.com/1/","accessToken":"access"}"#;

const TILE_BODY: &[u8] = b"quantized-mesh";

/// Serves auth, layer.json and tiles, recording every request.
struct FakeTerrainService {
    layer: String,
    delay: Duration,
    broken: Mutex<HashSet<String>>,
    requests: Mutex<Vec<String>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeTerrainService {
    fn new(max_zoom: u32) -> Self {
        Self {
            layer: format!(
                r#"{{"version":"1.2.0","tiles":["{{z}}/{{x}}/{{y}}.terrain?v={{version}}"],"minzoom":0,"maxzoom":{}}}"#,
                max_zoom
            ),
            delay: Duration::from_millis(1),
            broken: Mutex::new(HashSet::new()),
            requests: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Makes the tile at `level/x/y` fail halfway through its body.
    fn break_tile(&self, level: u32, x: u32, y: u32) {
        self.broken
            .lock()
            .unwrap()
            .insert(format!("/{}/{}/{}.terrain", level, x, y));
    }

    fn heal(&self) {
        self.broken.lock().unwrap().clear();
    }

    fn tile_requests(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains(".terrain"))
            .count()
    }

    fn auth_requests(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.contains("access_token="))
            .count()
    }
}

impl TerrainHttpClient for FakeTerrainService {
    async fn get(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<HttpResponse, ClientError> {
        self.requests.lock().unwrap().push(url.to_string());

        let (status, body) = if url.contains("access_token=") {
            (200, Bytes::from_static(AUTH_BODY.as_bytes()))
        } else if url.ends_with("layer.json") {
            (200, Bytes::from(self.layer.clone()))
        } else {
            (404, Bytes::new())
        };
        Ok(HttpResponse { status, body })
    }

    async fn get_streaming(
        &self,
        url: &str,
        headers: &[(String, String)],
        _timeout: Duration,
    ) -> Result<StreamingResponse, ClientError> {
        self.requests.lock().unwrap().push(url.to_string());

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        let authorized = headers
            .iter()
            .any(|(k, v)| k == "Authorization" && v == "Bearer access");
        if !authorized {
            return Ok(StreamingResponse {
                status: 401,
                content_length: None,
                body: stream::empty().boxed(),
            });
        }

        let broken = self
            .broken
            .lock()
            .unwrap()
            .iter()
            .any(|fragment| url.contains(fragment.as_str()));

        let chunks = if broken {
            vec![
                Ok(Bytes::from_static(&TILE_BODY[..5])),
                Err(ClientError::Body("connection reset".to_string())),
            ]
        } else {
            vec![
                Ok(Bytes::from_static(&TILE_BODY[..5])),
                Ok(Bytes::from_static(&TILE_BODY[5..])),
            ]
        };

        Ok(StreamingResponse {
            status: 200,
            content_length: Some(TILE_BODY.len() as u64),
            body: stream::iter(chunks).boxed(),
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn orchestrator(service: &Arc<FakeTerrainService>) -> DownloadOrchestrator<FakeTerrainService> {
    DownloadOrchestrator::new(Arc::clone(service)).with_in_flight(InFlightTiles::new())
}

fn beijing() -> GeographicRectangle {
    GeographicRectangle::new(116.0, 39.5, 117.0, 40.5).unwrap()
}

fn drain(rx: &mut EventReceiver) -> Vec<DownloadEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn count_tile_files(root: &Path) -> usize {
    fn walk(dir: &Path, count: &mut usize) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, count);
            } else if path.extension().is_some_and(|ext| ext == "terrain") {
                *count += 1;
            }
        }
    }
    let mut count = 0;
    walk(root, &mut count);
    count
}

// ============================================================================
// Integration Tests
// ============================================================================

/// Whole globe at levels 0 and 1 is exactly 2 + 8 tiles.
#[tokio::test]
async fn test_whole_globe_two_levels() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(FakeTerrainService::new(1));
    let mut orchestrator = orchestrator(&service);
    let config = DownloadConfig::new("dev", dir.path(), GeographicRectangle::GLOBAL);

    let (tx, mut rx) = event_channel();
    let summary = orchestrator.run(&config, Some(tx)).await.unwrap();

    assert_eq!(summary.total, 10);
    assert_eq!(summary.downloaded, 10);
    assert_eq!(summary.bytes, 10 * TILE_BODY.len() as u64);
    assert_eq!(service.tile_requests(), 10);
    assert_eq!(count_tile_files(dir.path()), 10);
    assert!(dir.path().join("auth.json").exists());
    assert!(dir.path().join("layer.json").exists());

    let events = drain(&mut rx);
    let updates: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            DownloadEvent::Update { current, total } => {
                assert_eq!(*total, 10);
                Some(*current)
            }
            _ => None,
        })
        .collect();
    assert_eq!(updates, (1..=10).collect::<Vec<_>>());
    assert_eq!(events.last(), Some(&DownloadEvent::Done));
}

/// The number of fetches equals the planned tile count.
#[tokio::test]
async fn test_fetch_count_matches_plan() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(FakeTerrainService::new(5));
    let mut orchestrator = orchestrator(&service);
    let config = DownloadConfig::new("dev", dir.path(), beijing()).with_concurrency(6);

    let summary = orchestrator.run(&config, None).await.unwrap();

    // Levels 0-3 cover the globe (2 + 8 + 32 + 128); 4 and 5 are 3x3 each.
    assert_eq!(summary.total, 188);
    assert_eq!(service.tile_requests() as u64, summary.total);
    assert_eq!(count_tile_files(dir.path()) as u64, summary.total);

    let layer = terrain_downloader::provider::LayerMetadata::from_slice(service.layer.as_bytes())
        .unwrap();
    let plan = orchestrator.plan(&config, Some(&layer));
    assert_eq!(total_tiles(&plan), summary.total);
}

/// Concurrent fetches never exceed the configured limit.
#[tokio::test]
async fn test_concurrency_limit_respected() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(FakeTerrainService::new(2));
    let mut orchestrator = orchestrator(&service);
    let config = DownloadConfig::new("dev", dir.path(), GeographicRectangle::GLOBAL)
        .with_concurrency(4);

    let summary = orchestrator.run(&config, None).await.unwrap();

    assert_eq!(summary.downloaded, 2 + 8 + 32);
    let peak = service.peak.load(Ordering::SeqCst);
    assert!(peak <= 4, "peak concurrency was {}", peak);
    assert!(peak >= 1);
}

/// A second job over the same store makes no tile requests.
#[tokio::test]
async fn test_resume_skips_stored_tiles() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(FakeTerrainService::new(1));
    let config = DownloadConfig::new("dev", dir.path(), GeographicRectangle::GLOBAL);

    orchestrator(&service).run(&config, None).await.unwrap();
    assert_eq!(service.tile_requests(), 10);

    // Fresh orchestrator: authenticates again, but layer.json and tiles come from disk.
    let summary = orchestrator(&service).run(&config, None).await.unwrap();
    assert_eq!(summary.skipped, 10);
    assert_eq!(summary.downloaded, 10);
    assert_eq!(service.tile_requests(), 10);
    assert_eq!(service.auth_requests(), 2);
}

/// A broken body leaves no file behind and the next run completes it.
#[tokio::test]
async fn test_failed_tile_is_cleaned_up_and_retried() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(FakeTerrainService::new(1));
    service.break_tile(1, 2, 1);
    let config = DownloadConfig::new("dev", dir.path(), GeographicRectangle::GLOBAL);
    let mut orchestrator = orchestrator(&service);

    let (tx, mut rx) = event_channel();
    let summary = orchestrator.run(&config, Some(tx)).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.downloaded, 9);
    assert!(!dir.path().join("1/2/1.terrain").exists());
    assert_eq!(count_tile_files(dir.path()), 9);

    let events = drain(&mut rx);
    let error = events
        .iter()
        .find_map(|e| match e {
            DownloadEvent::Error { message } => Some(message.clone()),
            _ => None,
        })
        .unwrap();
    assert!(error.contains("1/2/1"), "{}", error);

    service.heal();
    let requests_before = service.tile_requests();
    let summary = orchestrator.run(&config, None).await.unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.skipped, 9);
    assert_eq!(service.tile_requests(), requests_before + 1);
    assert_eq!(
        std::fs::read(dir.path().join("1/2/1.terrain")).unwrap(),
        TILE_BODY
    );
    assert_eq!(orchestrator.state(), JobState::Done);
}
