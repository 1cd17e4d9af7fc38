//! Lifecycle of a download job.

use std::fmt;

/// Stage a job is in.
///
/// ```text
/// Idle → Authenticating → LoadingMetadata → Planning → Fetching → Done
///              └──────────────┴──→ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Authenticating,
    LoadingMetadata,
    Planning,
    Fetching,
    Done,
    Failed,
}

impl JobState {
    /// Whether `next` may follow `self`.
    ///
    /// Authentication is skipped when a session is already cached, and a
    /// finished orchestrator may start another job.
    pub fn can_transition_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Idle | Done | Failed, Authenticating)
                | (Idle | Done | Failed, LoadingMetadata)
                | (Authenticating, LoadingMetadata)
                | (Authenticating, Failed)
                | (LoadingMetadata, Planning)
                | (LoadingMetadata, Failed)
                | (Planning, Fetching)
                | (Fetching, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Idle => "idle",
            JobState::Authenticating => "authenticating",
            JobState::LoadingMetadata => "loading metadata",
            JobState::Planning => "planning",
            JobState::Fetching => "fetching",
            JobState::Done => "done",
            JobState::Failed => "failed",
        };
        f.write_str(name)
    }
}
