// crates/server/src/jobs/broadcaster.rs
//! Per-job progress fan-out.
//!
//! Each job gets its own broadcast channel, created lazily on first use.
//! Publishing never blocks: a slow subscriber lags and loses the oldest
//! buffered events, and a job with no subscribers drops events on the floor.
//! Channels carry no history; a subscriber only sees events sent after it
//! joined.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;
use wavescribe_types::{JobId, ProgressEvent};

/// Buffered events per channel before a slow subscriber starts lagging.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
pub struct EventBroadcaster {
    channels: Mutex<HashMap<JobId, broadcast::Sender<ProgressEvent>>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, broadcast::Sender<ProgressEvent>>> {
        match self.channels.lock() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::error!("Mutex poisoned locking event channels: {e}");
                // The map holds only channel senders, so a poisoned lock
                // leaves nothing half-updated.
                e.into_inner()
            }
        }
    }

    /// Subscribe to a job's events, creating the channel if needed.
    pub fn subscribe(&self, id: JobId) -> broadcast::Receiver<ProgressEvent> {
        self.lock()
            .entry(id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish an event to the job's subscribers, if any.
    pub fn publish(&self, event: &ProgressEvent) {
        let tx = self.lock().get(&event.job_id).cloned();
        if let Some(tx) = tx {
            // Ignore send errors (no subscribers is fine).
            let _ = tx.send(event.clone());
        }
    }

    /// Drop the job's channel. Subscribers drain what is already buffered
    /// and then see the stream close.
    pub fn finish(&self, id: JobId) {
        self.lock().remove(&id);
    }
}
