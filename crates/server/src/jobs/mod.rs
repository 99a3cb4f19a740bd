// crates/server/src/jobs/mod.rs
//! Background job orchestration.
//!
//! A submission reserves a slot in the bounded queue, creates a pending
//! record, and hands the job id to the worker pool. Workers drive the
//! record through `processing` into exactly one terminal state, streaming
//! progress to subscribers along the way. Terminal states absorb every
//! later transition attempt, so a terminate request can never be undone
//! by a worker finishing behind it.

pub mod broadcaster;
pub mod queue;
pub mod record;
pub mod service;
pub mod store;
pub mod worker;

pub use broadcaster::EventBroadcaster;
pub use queue::{JobQueue, JobReceiver, QueueError};
pub use record::{event_from_view, JobParams, JobRecord, ProcessHandle};
pub use service::{JobService, StartedJob, SubmitError, TerminateError};
pub use store::{DuplicateJob, JobStore};
pub use worker::{spawn_workers, WorkerContext};
