// crates/server/src/state.rs
//! Shared state handed to every route handler.

use crate::jobs::JobService;
use std::sync::Arc;
use std::time::Instant;
use wavescribe_db::Database;

/// Everything the HTTP layer needs: persistence and the job service.
pub struct AppState {
    /// When the process came up, for the health endpoint's uptime field.
    pub start_time: Instant,
    /// SQLite handle for recordings, transcripts, and summaries.
    pub db: Database,
    /// Job orchestration: store, queue, and progress fan-out.
    pub jobs: Arc<JobService>,
}

impl AppState {
    pub fn new(db: Database, jobs: Arc<JobService>) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            jobs,
        })
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
