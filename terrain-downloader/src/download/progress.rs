//! Progress reporting for download jobs.
//!
//! Tile handlers finish concurrently, so counters are atomics. Every change
//! is pushed to an optional event channel read by a single listener.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::store::{TileResult, TileSource};

/// Event sent to the job's listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    /// A tile finished; `current` is the number of tiles stored so far.
    Update { current: u64, total: u64 },
    /// A tile or the whole job failed.
    Error { message: String },
    /// Sent exactly once, after the last tile.
    Done,
}

/// Sending half of a job's event channel.
pub type EventSender = mpsc::UnboundedSender<DownloadEvent>;

/// Receiving half of a job's event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<DownloadEvent>;

/// Creates an event channel for [`DownloadOrchestrator::run`](super::DownloadOrchestrator::run).
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Final counts of a job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Tiles in the plan.
    pub total: u64,
    /// Tiles now on disk, including ones that already were.
    pub downloaded: u64,
    /// Subset of `downloaded` that needed no request.
    pub skipped: u64,
    pub failed: u64,
    /// Sum of reported tile sizes.
    pub bytes: u64,
    /// The job stopped before every tile was attempted.
    pub cancelled: bool,
}

impl DownloadSummary {
    /// Tiles that were never attempted.
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.downloaded + self.failed)
    }

    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.failed == 0 && self.downloaded == self.total
    }
}

/// Job-scoped progress counters and event sink.
#[derive(Debug)]
pub struct JobProgress {
    total: u64,
    downloaded: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    bytes: AtomicU64,
    done: AtomicBool,
    events: Option<EventSender>,
}

impl JobProgress {
    pub fn new(total: u64, events: Option<EventSender>) -> Self {
        Self {
            total,
            downloaded: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            done: AtomicBool::new(false),
            events,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn downloaded(&self) -> u64 {
        self.downloaded.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    /// Counts a stored tile and emits an update.
    pub fn record_success(&self, result: &TileResult) {
        if result.source == TileSource::Cached {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }
        self.bytes.fetch_add(result.bytes, Ordering::SeqCst);
        let current = self.downloaded.fetch_add(1, Ordering::SeqCst) + 1;
        self.emit(DownloadEvent::Update {
            current,
            total: self.total,
        });
    }

    /// Counts a failed tile and emits the error followed by an update.
    pub fn record_failure(&self, message: impl Into<String>) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.emit_error(message);
        self.emit(DownloadEvent::Update {
            current: self.downloaded(),
            total: self.total,
        });
    }

    /// Emits an error without touching the counters.
    pub fn emit_error(&self, message: impl Into<String>) {
        self.emit(DownloadEvent::Error {
            message: message.into(),
        });
    }

    /// Emits `Done`. Later calls do nothing.
    pub fn finish(&self) {
        if !self.done.swap(true, Ordering::SeqCst) {
            self.emit(DownloadEvent::Done);
        }
    }

    pub fn summary(&self, cancelled: bool) -> DownloadSummary {
        DownloadSummary {
            total: self.total,
            downloaded: self.downloaded(),
            skipped: self.skipped.load(Ordering::SeqCst),
            failed: self.failed(),
            bytes: self.bytes.load(Ordering::SeqCst),
            cancelled,
        }
    }

    fn emit(&self, event: DownloadEvent) {
        if let Some(events) = &self.events {
            // A listener that went away is not an error for the job.
            let _ = events.send(event);
        }
    }
}
