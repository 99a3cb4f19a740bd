//! API route handlers for the wavescribe server.

pub mod events;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod recordings;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router.
///
/// Routes:
/// - GET    /health                       - Health check
/// - GET    /metrics                      - Prometheus metrics
/// - POST   /jobs                         - Submit a transcription or summarization job
/// - GET    /jobs                         - List jobs (`?active=true` narrows and enriches)
/// - GET    /jobs/{id}                    - Fetch one job
/// - DELETE /jobs/{id}                    - Terminate a pending or processing job
/// - GET    /events?job_id={id}           - SSE stream of a job's progress
/// - POST   /recordings                   - Register a recording
/// - GET    /recordings                   - List recordings
/// - GET    /recordings/{id}/transcript   - Transcript and summary for a recording
/// - PUT    /recordings/{id}/speakers     - Attach manual speaker labels
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(metrics::router())
        .merge(jobs::router())
        .merge(events::router())
        .merge(recordings::router())
        .with_state(state)
}
