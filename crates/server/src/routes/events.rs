// crates/server/src/routes/events.rs
//! Server-sent progress events for jobs.
//!
//! - GET /events?job_id={id} - Stream a job's progress until it finishes

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    job_id: String,
}

/// GET /events - SSE stream of one job's progress.
///
/// The first frame is always a snapshot of the current state. A subscriber
/// arriving after the job finished gets that single terminal frame and the
/// stream closes; it never hangs waiting for events that already happened.
async fn stream_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>> {
    let id = Uuid::parse_str(&query.job_id)
        .map_err(|_| ApiError::BadRequest(format!("invalid job id: {}", query.job_id)))?;

    let Some((snapshot, receiver)) = state.jobs.subscribe(id) else {
        return Err(ApiError::JobNotFound(id));
    };

    let stream = async_stream::stream! {
        let json = serde_json::to_string(&snapshot).unwrap_or_default();
        yield Ok(Event::default().data(json));

        let Some(mut rx) = receiver else {
            return;
        };
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let terminal = event.status.is_terminal();
                    let json = serde_json::to_string(&event).unwrap_or_default();
                    yield Ok(Event::default().data(json));
                    if terminal {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(job_id = %id, skipped, "SSE subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream))
}

/// Build the events router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", get(stream_events))
}
