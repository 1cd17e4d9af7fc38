//! Download job orchestration.
//!
//! Drives one job from token exchange to the last tile and reports progress
//! over the job's event channel.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::DownloadConfig;
use super::error::{DownloadError, DownloadResult};
use super::progress::{DownloadSummary, EventSender, JobProgress};
use super::state::JobState;
use crate::executor::BoundedWorkPool;
use crate::planner::{total_tiles, LevelPlan, StorageEstimate};
use crate::provider::{LayerMetadata, MetadataError, Session, SessionAuth, TerrainHttpClient};
use crate::store::{InFlightTiles, TileStore};

/// Top-level driver for download jobs.
///
/// Holds the authenticated [`Session`] between jobs so the token exchange
/// runs once per orchestrator.
pub struct DownloadOrchestrator<C> {
    client: Arc<C>,
    session: Option<Session>,
    state: JobState,
    cancel: CancellationToken,
    in_flight: InFlightTiles,
}

impl<C: TerrainHttpClient> DownloadOrchestrator<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            session: None,
            state: JobState::Idle,
            cancel: CancellationToken::new(),
            in_flight: InFlightTiles::global(),
        }
    }

    /// Stops starting new tiles once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Uses a specific in-flight registry instead of the process-wide one.
    pub fn with_in_flight(mut self, in_flight: InFlightTiles) -> Self {
        self.in_flight = in_flight;
        self
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Expected disk usage for `config`, computed without any network access.
    ///
    /// Uses the `layer.json` cached in the store when a previous job saved
    /// one, so it agrees with what `run` fetches.
    pub fn estimate_storage(
        &self,
        config: &DownloadConfig,
    ) -> Result<StorageEstimate, MetadataError> {
        config.estimate_storage()
    }

    /// The per-level tile plan for `config`.
    ///
    /// With metadata, its zoom bounds and availability table apply.
    pub fn plan(&self, config: &DownloadConfig, metadata: Option<&LayerMetadata>) -> Vec<LevelPlan> {
        config.plan(metadata)
    }

    /// Runs a download job to completion.
    ///
    /// Every tile of the plan is fetched through a bounded pool. Tile
    /// failures are counted and reported as events; only authentication and
    /// metadata failures abort the job, after emitting `Error` and `Done`.
    pub async fn run(
        &mut self,
        config: &DownloadConfig,
        events: Option<EventSender>,
    ) -> DownloadResult<DownloadSummary> {
        let session = match self.session.clone() {
            Some(session) => {
                debug!("Reusing cached session");
                session
            }
            None => {
                self.transition(JobState::Authenticating);
                let auth = SessionAuth::new(
                    Arc::clone(&self.client),
                    config.auth_endpoint.clone(),
                    config.store_dir.clone(),
                );
                match auth.authenticate(&config.dev_token).await {
                    Ok(session) => {
                        self.session = Some(session.clone());
                        session
                    }
                    Err(e) => return Err(self.fail(e.into(), events)),
                }
            }
        };

        self.transition(JobState::LoadingMetadata);
        let metadata =
            match LayerMetadata::load(self.client.as_ref(), &session, &config.store_dir).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    // The access token may have expired; authenticate again next time.
                    self.session = None;
                    return Err(self.fail(e.into(), events));
                }
            };

        self.transition(JobState::Planning);
        let plan = self.plan(config, Some(&metadata));
        let total = total_tiles(&plan);
        info!(
            total_tiles = total,
            levels = plan.len(),
            concurrency = config.concurrency,
            "Download planned"
        );

        self.transition(JobState::Fetching);
        let progress = JobProgress::new(total, events);
        let store = TileStore::new(
            config.store_dir.clone(),
            Arc::clone(&self.client),
            session,
            Arc::new(metadata),
        )
        .with_timeout(config.tile_timeout)
        .with_in_flight(self.in_flight.clone());

        let tiles = plan
            .iter()
            .flat_map(|lp| lp.ranges.iter().flat_map(move |range| range.tiles(lp.level)));

        let started = BoundedWorkPool::new(config.concurrency)
            .run_until_cancelled(
                tiles,
                |tile| {
                    let store = &store;
                    let progress = &progress;
                    async move {
                        match store.fetch_tile(tile).await {
                            Ok(result) => progress.record_success(&result),
                            Err(e) => {
                                warn!(
                                    level = tile.level,
                                    x = tile.x,
                                    y = tile.y,
                                    error = %e,
                                    "Tile failed"
                                );
                                progress.record_failure(format!("tile {}: {}", tile, e));
                            }
                        }
                    }
                },
                &self.cancel,
            )
            .await;

        let cancelled = (started as u64) < total;
        progress.finish();
        self.transition(JobState::Done);

        let summary = progress.summary(cancelled);
        info!(
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            bytes = summary.bytes,
            cancelled = summary.cancelled,
            "Download finished"
        );
        Ok(summary)
    }

    fn transition(&mut self, next: JobState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid job transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "Job state");
        self.state = next;
    }

    fn fail(&mut self, err: DownloadError, events: Option<EventSender>) -> DownloadError {
        error!(stage = %self.state, error = %err, "Download job failed");
        self.transition(JobState::Failed);

        let progress = JobProgress::new(0, events);
        progress.emit_error(err.to_string());
        progress.finish();
        err
    }
}
