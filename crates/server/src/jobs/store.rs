// crates/server/src/jobs/store.rs
//! Concurrent in-memory map of job records.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use uuid::Uuid;
use wavescribe_types::{JobId, JobKind, JobView};

use super::record::{JobParams, JobRecord};

/// Rejection for a submission that duplicates a still-active job.
#[derive(Debug, Error)]
#[error("{kind} already active for recording {recording_id} (job {existing})")]
pub struct DuplicateJob {
    pub kind: JobKind,
    pub recording_id: String,
    pub existing: JobId,
}

/// Thread-safe store of all job records, keyed by id.
///
/// Records are kept for the lifetime of the server so terminal jobs stay
/// queryable.
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, JobRecord>> {
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(e) => {
                // Record mutations never leave the map half-updated, so the
                // data behind a poisoned lock is still usable.
                tracing::error!("RwLock poisoned reading jobs map: {e}");
                e.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, JobRecord>> {
        match self.jobs.write() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!("RwLock poisoned writing jobs map: {e}");
                e.into_inner()
            }
        }
    }

    /// Create a pending record, rejecting a duplicate of a still-active
    /// (kind, recording) pair. Check and insert happen under one write lock
    /// so two racing submissions cannot both pass.
    pub fn create(
        &self,
        kind: JobKind,
        recording_id: &str,
        params: JobParams,
    ) -> Result<JobView, DuplicateJob> {
        let record = JobRecord::new(Uuid::new_v4(), kind, recording_id.to_string(), params);
        let view = record.view();

        let mut jobs = self.write();
        if let Some(existing) = jobs
            .values()
            .find(|r| r.recording_id == recording_id && r.kind == kind && !r.status().is_terminal())
        {
            return Err(DuplicateJob {
                kind,
                recording_id: recording_id.to_string(),
                existing: existing.id,
            });
        }
        jobs.insert(view.id, record);
        Ok(view)
    }

    /// Snapshot one job.
    pub fn get(&self, id: JobId) -> Option<JobView> {
        self.read().get(&id).map(|r| r.view())
    }

    /// Run a mutation against one record under the write lock. Returns the
    /// closure's result, or `None` when the job does not exist.
    pub fn update<R>(&self, id: JobId, f: impl FnOnce(&mut JobRecord) -> R) -> Option<R> {
        self.write().get_mut(&id).map(f)
    }

    /// All jobs, newest first.
    pub fn list(&self) -> Vec<JobView> {
        let mut views: Vec<JobView> = self.read().values().map(|r| r.view()).collect();
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        views
    }

    /// Non-terminal jobs, newest first.
    pub fn list_active(&self) -> Vec<JobView> {
        let mut views: Vec<JobView> = self
            .read()
            .values()
            .filter(|r| !r.status().is_terminal())
            .map(|r| r.view())
            .collect();
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        views
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavescribe_core::TranscribeParams;
    use wavescribe_types::JobStatus;

    fn params() -> JobParams {
        JobParams::Transcription(TranscribeParams::default())
    }

    #[test]
    fn test_create_and_get() {
        let store = JobStore::new();
        let view = store.create(JobKind::Transcription, "rec-1", params()).unwrap();

        assert_eq!(view.status, JobStatus::Pending);
        assert_eq!(view.progress, 0.0);
        assert_eq!(view.recording_id, "rec-1");

        let fetched = store.get(view.id).unwrap();
        assert_eq!(fetched.id, view.id);
        assert!(store.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_duplicate_active_pair_rejected() {
        let store = JobStore::new();
        let first = store.create(JobKind::Transcription, "rec-1", params()).unwrap();

        let err = store
            .create(JobKind::Transcription, "rec-1", params())
            .unwrap_err();
        assert_eq!(err.existing, first.id);
        assert_eq!(store.len(), 1);

        // A different kind on the same recording is not a duplicate.
        store
            .create(JobKind::Summarization, "rec-1", JobParams::Transcription(TranscribeParams::default()))
            .unwrap();
        // Neither is the same kind on a different recording.
        store.create(JobKind::Transcription, "rec-2", params()).unwrap();
    }

    #[test]
    fn test_resubmit_allowed_after_terminal() {
        let store = JobStore::new();
        let first = store.create(JobKind::Transcription, "rec-1", params()).unwrap();

        store.update(first.id, |r| {
            r.set_status(JobStatus::Processing);
            r.set_status(JobStatus::Completed);
        });

        let second = store.create(JobKind::Transcription, "rec-1", params()).unwrap();
        assert_ne!(second.id, first.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_update_returns_closure_result() {
        let store = JobStore::new();
        let view = store.create(JobKind::Transcription, "rec-1", params()).unwrap();

        let applied = store.update(view.id, |r| r.set_status(JobStatus::Processing));
        assert_eq!(applied, Some(true));

        let missing = store.update(Uuid::new_v4(), |r| r.set_status(JobStatus::Processing));
        assert_eq!(missing, None);
    }

    #[test]
    fn test_list_active_filters_terminal() {
        let store = JobStore::new();
        let a = store.create(JobKind::Transcription, "rec-a", params()).unwrap();
        let b = store.create(JobKind::Transcription, "rec-b", params()).unwrap();

        store.update(a.id, |r| {
            r.set_status(JobStatus::Terminated);
        });

        let active = store.list_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, b.id);

        // Full list still holds both.
        assert_eq!(store.list().len(), 2);
    }
}
