// crates/server/src/jobs/queue.rs
//! Bounded FIFO of pending job ids.
//!
//! A submission reserves its slot before the record exists, so an at-capacity
//! queue rejects with no side effects. Workers consume from the paired
//! receiver; an idle worker just sits in `recv().await`.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use wavescribe_types::JobId;

/// Worker-side end of the queue.
pub type JobReceiver = mpsc::Receiver<JobId>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job queue is full (capacity {0})")]
    Full(usize),
    #[error("job queue is closed")]
    Closed,
}

/// A reserved queue slot. Dropping it without sending releases the slot.
pub struct QueueSlot {
    permit: mpsc::OwnedPermit<JobId>,
}

impl QueueSlot {
    /// Enqueue the job id into the reserved slot. Cannot fail.
    pub fn send(self, id: JobId) {
        self.permit.send(id);
    }
}

/// Submission-side handle to the bounded queue.
pub struct JobQueue {
    tx: mpsc::Sender<JobId>,
}

impl JobQueue {
    pub fn new(capacity: usize) -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Reserve a slot without blocking. Fails immediately when the queue is
    /// at capacity.
    pub fn try_reserve(&self) -> Result<QueueSlot, QueueError> {
        match self.tx.clone().try_reserve_owned() {
            Ok(permit) => Ok(QueueSlot { permit }),
            Err(TrySendError::Full(_)) => Err(QueueError::Full(self.tx.max_capacity())),
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    /// Slots currently taken (queued jobs plus unsent reservations).
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_fifo_order() {
        let (queue, mut rx) = JobQueue::new(4);
        let ids: Vec<JobId> = (0..3).map(|_| Uuid::new_v4()).collect();

        for id in &ids {
            queue.try_reserve().unwrap().send(*id);
        }

        for id in &ids {
            assert_eq!(rx.recv().await, Some(*id));
        }
    }

    #[tokio::test]
    async fn test_full_queue_rejects() {
        let (queue, mut rx) = JobQueue::new(2);

        queue.try_reserve().unwrap().send(Uuid::new_v4());
        queue.try_reserve().unwrap().send(Uuid::new_v4());
        assert!(matches!(queue.try_reserve(), Err(QueueError::Full(2))));
        assert_eq!(queue.depth(), 2);

        // Draining one slot makes room again.
        rx.recv().await.unwrap();
        assert!(queue.try_reserve().is_ok());
    }

    #[tokio::test]
    async fn test_dropped_reservation_releases_slot() {
        let (queue, _rx) = JobQueue::new(1);

        let slot = queue.try_reserve().unwrap();
        assert!(matches!(queue.try_reserve(), Err(QueueError::Full(1))));

        drop(slot);
        assert!(queue.try_reserve().is_ok());
        assert_eq!(queue.capacity(), 1);
    }

    #[tokio::test]
    async fn test_closed_after_receiver_drop() {
        let (queue, rx) = JobQueue::new(1);
        drop(rx);
        assert!(matches!(queue.try_reserve(), Err(QueueError::Closed)));
    }
}
