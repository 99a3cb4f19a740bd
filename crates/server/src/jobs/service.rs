// crates/server/src/jobs/service.rs
//! Orchestration facade over the job store, queue, and event broadcaster.
//!
//! All status transitions flow through this type so that the transition
//! guard, process-handle discipline, and event publication stay in one
//! place. Workers call `begin_processing` / `record_progress` / the
//! `*_job` finishers; HTTP handlers call `submit`, `terminate`, and the
//! read-side accessors.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use wavescribe_types::{JobId, JobKind, JobStatus, JobView, ProgressEvent};

use super::broadcaster::EventBroadcaster;
use super::queue::{JobQueue, JobReceiver, QueueError};
use super::record::{event_from_view, JobParams, ProcessHandle};
use super::store::{DuplicateJob, JobStore};
use crate::metrics;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Duplicate(#[from] DuplicateJob),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

#[derive(Debug, Error)]
pub enum TerminateError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already {0}")]
    AlreadyFinished(JobStatus),
}

/// Everything a worker needs to run a job it has claimed.
#[derive(Debug)]
pub struct StartedJob {
    pub id: JobId,
    pub kind: JobKind,
    pub recording_id: String,
    pub params: JobParams,
    /// Fires when a terminate request wants the in-flight work stopped.
    pub kill: CancellationToken,
}

pub struct JobService {
    store: JobStore,
    queue: JobQueue,
    events: EventBroadcaster,
}

impl JobService {
    /// Build the service and the receiver end of its work queue. The
    /// receiver goes to the worker pool; dropping it closes submissions.
    pub fn new(queue_capacity: usize) -> (Arc<Self>, JobReceiver) {
        let (queue, rx) = JobQueue::new(queue_capacity);
        let service = Arc::new(Self {
            store: JobStore::new(),
            queue,
            events: EventBroadcaster::new(),
        });
        (service, rx)
    }

    /// Accept a job: reserve a queue slot, create the pending record, and
    /// enqueue its id.
    ///
    /// The slot is reserved first so a full queue rejects the submission
    /// before any record exists. A duplicate rejection drops the unsent
    /// reservation, which releases the slot.
    pub fn submit(
        &self,
        kind: JobKind,
        recording_id: &str,
        params: JobParams,
    ) -> Result<JobView, SubmitError> {
        let slot = self.queue.try_reserve()?;
        let view = self.store.create(kind, recording_id, params)?;
        slot.send(view.id);

        metrics::record_job_submitted(kind.as_str());
        metrics::record_queue_depth(self.queue.depth());
        tracing::info!(job_id = %view.id, kind = %kind, recording_id = recording_id, "job queued");
        Ok(view)
    }

    /// Terminate a job that has not finished yet.
    ///
    /// A processing job has its kill switch fired here; the worker reaps
    /// the process and publishes the final event. A pending job goes
    /// straight to terminated, and a later dequeue of its id is a no-op.
    pub fn terminate(&self, id: JobId) -> Result<JobView, TerminateError> {
        let (view, handle, event) = self
            .store
            .update(id, |record| {
                if record.status().is_terminal() {
                    return Err(TerminateError::AlreadyFinished(record.status()));
                }
                let handle = record.take_process();
                record.set_status(JobStatus::Terminated);
                Ok((record.view(), handle, record.progress_event()))
            })
            .ok_or(TerminateError::NotFound(id))??;

        match handle {
            Some(handle) => {
                // The worker observes the kill, reaps the process, and
                // publishes the final event.
                handle.kill();
                tracing::info!(job_id = %id, "job terminate requested, killing process");
            }
            None => {
                self.events.publish(&event);
                self.events.finish(id);
                let elapsed = (Utc::now() - view.created_at).to_std().unwrap_or_default();
                metrics::record_job_finished(view.kind.as_str(), view.status.as_str(), elapsed);
                tracing::info!(job_id = %id, "pending job terminated");
            }
        }
        Ok(view)
    }

    /// Claim a dequeued job for processing.
    ///
    /// Returns `None` when the job is gone or already terminal, in which
    /// case the caller must skip it without any side effects.
    pub fn begin_processing(&self, id: JobId) -> Option<StartedJob> {
        let (job, event) = self
            .store
            .update(id, |record| {
                if !record.set_status(JobStatus::Processing) {
                    return None;
                }
                let handle = ProcessHandle::new();
                let kill = handle.token();
                record.install_process(handle);
                Some((
                    StartedJob {
                        id: record.id,
                        kind: record.kind,
                        recording_id: record.recording_id.clone(),
                        params: record.params.clone(),
                        kill,
                    },
                    record.progress_event(),
                ))
            })
            .flatten()?;

        self.events.publish(&event);
        metrics::record_queue_depth(self.queue.depth());
        tracing::info!(job_id = %id, kind = %job.kind, "job started");
        Some(job)
    }

    /// Merge a progress report into the record and fan it out.
    ///
    /// Reports for jobs that are not processing are dropped, as are
    /// reports that do not advance the stored value.
    pub fn record_progress(&self, id: JobId, pct: f32) {
        let event = self
            .store
            .update(id, |record| {
                if record.status() != JobStatus::Processing {
                    return None;
                }
                let before = record.progress();
                record.merge_progress(pct);
                if record.progress() > before {
                    Some(record.progress_event())
                } else {
                    None
                }
            })
            .flatten();

        if let Some(event) = event {
            self.events.publish(&event);
        }
    }

    /// Mark a processing job completed.
    pub fn complete_job(&self, id: JobId) {
        self.finish_with(id, JobStatus::Completed, None);
    }

    /// Mark a processing job failed, recording the error for clients.
    pub fn fail_job(&self, id: JobId, error: String) {
        self.finish_with(id, JobStatus::Failed, Some(error));
    }

    /// Finish a job whose process was reaped after a terminate request.
    pub fn finish_terminated(&self, id: JobId) {
        self.finish_with(id, JobStatus::Terminated, None);
    }

    fn finish_with(&self, id: JobId, desired: JobStatus, error: Option<String>) {
        let Some((status, event, view)) = self.store.update(id, |record| {
            record.take_process();
            let applied = record.set_status(desired);
            if applied {
                match desired {
                    JobStatus::Completed => record.merge_progress(100.0),
                    JobStatus::Failed => record.error = error,
                    _ => {}
                }
            }
            // When the transition is refused the record is already terminal
            // (a terminate won the race); report that status instead.
            (record.status(), record.progress_event(), record.view())
        }) else {
            tracing::error!(job_id = %id, "finished job missing from store");
            return;
        };

        self.events.publish(&event);
        self.events.finish(id);

        let elapsed = (Utc::now() - view.created_at).to_std().unwrap_or_default();
        metrics::record_job_finished(view.kind.as_str(), status.as_str(), elapsed);
        match status {
            JobStatus::Failed => {
                tracing::warn!(job_id = %id, error = ?view.error, "job failed");
            }
            _ => {
                tracing::info!(job_id = %id, status = %status, "job finished");
            }
        }
    }

    /// Subscribe to a job's event stream.
    ///
    /// Returns the current state as a snapshot event, plus a receiver for
    /// later events when the job is still active. A terminal job yields
    /// only the snapshot, so a late subscriber never hangs.
    pub fn subscribe(
        &self,
        id: JobId,
    ) -> Option<(ProgressEvent, Option<broadcast::Receiver<ProgressEvent>>)> {
        // Subscribe before snapshotting so no event can fall in the gap
        // between the two.
        let rx = self.events.subscribe(id);
        let Some(view) = self.store.get(id) else {
            self.events.finish(id);
            return None;
        };

        let snapshot = event_from_view(&view);
        if view.status.is_terminal() {
            self.events.finish(id);
            return Some((snapshot, None));
        }
        Some((snapshot, Some(rx)))
    }

    pub fn get(&self, id: JobId) -> Option<JobView> {
        self.store.get(id)
    }

    pub fn list(&self) -> Vec<JobView> {
        self.store.list()
    }

    pub fn list_active(&self) -> Vec<JobView> {
        self.store.list_active()
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavescribe_core::TranscribeParams;

    fn transcription_params() -> JobParams {
        JobParams::Transcription(TranscribeParams::default())
    }

    #[tokio::test]
    async fn test_submit_creates_pending_job_and_enqueues_id() {
        let (service, mut rx) = JobService::new(8);

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        assert_eq!(view.status, JobStatus::Pending);
        assert_eq!(view.progress, 0.0);
        assert_eq!(rx.recv().await, Some(view.id));
        assert_eq!(service.get(view.id).unwrap().recording_id, "rec-1");
    }

    #[tokio::test]
    async fn test_duplicate_active_submit_rejected() {
        let (service, _rx) = JobService::new(8);

        service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        let err = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap_err();
        assert!(matches!(err, SubmitError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_full_queue_rejects_with_no_record() {
        let (service, _rx) = JobService::new(1);

        service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        let err = service
            .submit(JobKind::Transcription, "rec-2", transcription_params())
            .unwrap_err();

        assert!(matches!(err, SubmitError::Queue(QueueError::Full(1))));
        // The rejected submission left nothing behind.
        assert_eq!(service.list().len(), 1);
        assert_eq!(service.queue_depth(), 1);
    }

    #[tokio::test]
    async fn test_terminate_pending_job_suppresses_later_start() {
        let (service, _rx) = JobService::new(8);

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        let terminated = service.terminate(view.id).unwrap();
        assert_eq!(terminated.status, JobStatus::Terminated);

        // Dequeueing the id later must not start anything.
        assert!(service.begin_processing(view.id).is_none());
        assert_eq!(service.get(view.id).unwrap().status, JobStatus::Terminated);
    }

    #[tokio::test]
    async fn test_terminate_unknown_or_finished() {
        let (service, _rx) = JobService::new(8);

        let missing = uuid::Uuid::new_v4();
        assert!(matches!(
            service.terminate(missing),
            Err(TerminateError::NotFound(id)) if id == missing
        ));

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        service.begin_processing(view.id).unwrap();
        service.complete_job(view.id);
        assert!(matches!(
            service.terminate(view.id),
            Err(TerminateError::AlreadyFinished(JobStatus::Completed))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_terminations_resolve_to_one_winner() {
        let (service, _rx) = JobService::new(8);

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();

        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.terminate(view.id) })
        };
        let second = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.terminate(view.id) })
        };
        let (first, second) = (first.await.unwrap(), second.await.unwrap());

        // Whichever order the store lock granted, exactly one call wins.
        assert_eq!(
            [&first, &second].iter().filter(|r| r.is_ok()).count(),
            1,
            "got {first:?} / {second:?}"
        );
        let loser = if first.is_ok() { second } else { first };
        assert!(matches!(
            loser,
            Err(TerminateError::AlreadyFinished(JobStatus::Terminated))
        ));
        assert_eq!(service.get(view.id).unwrap().status, JobStatus::Terminated);
    }

    #[tokio::test]
    async fn test_terminate_fires_kill_for_processing_job() {
        let (service, _rx) = JobService::new(8);

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        let job = service.begin_processing(view.id).unwrap();
        assert!(!job.kill.is_cancelled());

        service.terminate(view.id).unwrap();
        assert!(job.kill.is_cancelled());
        assert_eq!(service.get(view.id).unwrap().status, JobStatus::Terminated);

        // The handle was taken, so a second terminate reports terminal.
        assert!(matches!(
            service.terminate(view.id),
            Err(TerminateError::AlreadyFinished(JobStatus::Terminated))
        ));
    }

    #[tokio::test]
    async fn test_progress_only_advances() {
        let (service, _rx) = JobService::new(8);

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        service.begin_processing(view.id).unwrap();

        service.record_progress(view.id, 10.0);
        service.record_progress(view.id, 55.0);
        service.record_progress(view.id, 30.0);
        assert_eq!(service.get(view.id).unwrap().progress, 55.0);
    }

    #[tokio::test]
    async fn test_progress_ignored_outside_processing() {
        let (service, _rx) = JobService::new(8);

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        service.record_progress(view.id, 40.0);
        assert_eq!(service.get(view.id).unwrap().progress, 0.0);
    }

    #[tokio::test]
    async fn test_complete_pins_progress_to_full() {
        let (service, _rx) = JobService::new(8);

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        service.begin_processing(view.id).unwrap();
        service.record_progress(view.id, 40.0);
        service.complete_job(view.id);

        let done = service.get(view.id).unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.progress, 100.0);
    }

    #[tokio::test]
    async fn test_fail_records_error() {
        let (service, _rx) = JobService::new(8);

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        service.begin_processing(view.id).unwrap();
        service.fail_job(view.id, "transcriber exited with 3".to_string());

        let failed = service.get(view.id).unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("transcriber exited with 3"));
    }

    #[tokio::test]
    async fn test_terminate_beats_late_completion() {
        let (service, _rx) = JobService::new(8);

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        service.begin_processing(view.id).unwrap();
        service.terminate(view.id).unwrap();

        // The worker reports success after the kill won the race; the
        // terminal status must not change.
        service.complete_job(view.id);
        assert_eq!(service.get(view.id).unwrap().status, JobStatus::Terminated);
    }

    #[tokio::test]
    async fn test_subscribe_unknown_job() {
        let (service, _rx) = JobService::new(8);
        assert!(service.subscribe(uuid::Uuid::new_v4()).is_none());
    }

    #[tokio::test]
    async fn test_subscribe_terminal_job_yields_snapshot_only() {
        let (service, _rx) = JobService::new(8);

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        service.begin_processing(view.id).unwrap();
        service.complete_job(view.id);

        let (snapshot, receiver) = service.subscribe(view.id).unwrap();
        assert_eq!(snapshot.status, JobStatus::Completed);
        assert_eq!(snapshot.progress, 100.0);
        assert!(receiver.is_none());
    }

    #[tokio::test]
    async fn test_subscribe_active_job_streams_until_terminal() {
        let (service, _rx) = JobService::new(8);

        let view = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        let (snapshot, receiver) = service.subscribe(view.id).unwrap();
        assert_eq!(snapshot.status, JobStatus::Pending);
        let mut receiver = receiver.unwrap();

        service.begin_processing(view.id).unwrap();
        service.record_progress(view.id, 30.0);
        service.complete_job(view.id);

        assert_eq!(receiver.recv().await.unwrap().status, JobStatus::Processing);
        assert_eq!(receiver.recv().await.unwrap().progress, 30.0);
        let last = receiver.recv().await.unwrap();
        assert_eq!(last.status, JobStatus::Completed);
        // Channel closes once the buffered events are drained.
        assert!(receiver.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_resubmit_after_terminal_gets_new_id() {
        let (service, _rx) = JobService::new(8);

        let first = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        service.terminate(first.id).unwrap();

        let second = service
            .submit(JobKind::Transcription, "rec-1", transcription_params())
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(service.list().len(), 2);
    }
}
