// crates/server/src/jobs/record.rs
//! The canonical record for a single job.
//!
//! Status and progress are private so every change goes through the
//! transition and monotonicity checks; everything else is plain data.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use wavescribe_core::{SummarizeParams, TranscribeParams};
use wavescribe_types::{JobId, JobKind, JobStatus, JobView, ProgressEvent};

/// Engine parameters captured at submission, by job kind.
#[derive(Debug, Clone)]
pub enum JobParams {
    Transcription(TranscribeParams),
    Summarization(SummarizeParams),
}

/// Kill switch for a running job.
///
/// Wraps a `CancellationToken` the worker selects on. `kill` is idempotent;
/// the take-once discipline in the service layer ensures only one caller
/// ever holds the handle.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    token: CancellationToken,
}

impl ProcessHandle {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// The token the worker's select loop watches.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Signal the job's process (or request) to stop.
    pub fn kill(&self) {
        self.token.cancel();
    }
}

impl Default for ProcessHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the orchestrator tracks about one job.
#[derive(Debug)]
pub struct JobRecord {
    pub id: JobId,
    pub kind: JobKind,
    pub recording_id: String,
    pub params: JobParams,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    status: JobStatus,
    progress: f32,
    process: Option<ProcessHandle>,
}

impl JobRecord {
    pub fn new(id: JobId, kind: JobKind, recording_id: String, params: JobParams) -> Self {
        Self {
            id,
            kind,
            recording_id,
            params,
            error: None,
            created_at: Utc::now(),
            status: JobStatus::Pending,
            progress: 0.0,
            process: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Apply a status transition. Returns whether it was legal; illegal
    /// transitions (anything out of a terminal state, or skipping
    /// `Processing`) leave the record untouched.
    pub fn set_status(&mut self, next: JobStatus) -> bool {
        use JobStatus::*;
        let legal = matches!(
            (self.status, next),
            (Pending, Processing)
                | (Pending, Terminated)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Terminated)
        );
        if legal {
            self.status = next;
        }
        legal
    }

    /// Fold in a reported percentage. Progress is clamped to 0..=100 and
    /// never decreases; out-of-order reports are absorbed silently.
    pub fn merge_progress(&mut self, pct: f32) {
        let clamped = pct.clamp(0.0, 100.0);
        if clamped > self.progress {
            self.progress = clamped;
        }
    }

    pub fn install_process(&mut self, handle: ProcessHandle) {
        self.process = Some(handle);
    }

    /// Remove and return the process handle, if one is installed. The
    /// caller that gets `Some` owns the kill.
    pub fn take_process(&mut self) -> Option<ProcessHandle> {
        self.process.take()
    }

    pub fn view(&self) -> JobView {
        JobView {
            id: self.id,
            kind: self.kind,
            recording_id: self.recording_id.clone(),
            status: self.status,
            progress: self.progress,
            error: self.error.clone(),
            created_at: self.created_at,
        }
    }

    /// Event snapshot of the current state, timestamped now.
    pub fn progress_event(&self) -> ProgressEvent {
        event_from_view(&self.view())
    }
}

/// Event snapshot for a view, used where the record itself is out of reach.
pub fn event_from_view(view: &JobView) -> ProgressEvent {
    ProgressEvent {
        job_id: view.id,
        kind: view.kind,
        status: view.status,
        progress: view.progress,
        message: None,
        error: view.error.clone(),
        timestamp: Utc::now().to_rfc3339(),
    }
}
