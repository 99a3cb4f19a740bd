// crates/server/src/routes/health.rs
//! Liveness endpoint.
//!
//! - GET /health - Process status, version, uptime, and queue depth

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Jobs currently waiting for a worker.
    pub queue_depth: usize,
}

/// GET /health - Report that the server is up.
///
/// `queue_depth` doubles as a cheap load signal: a monitor can alert on a
/// queue that stays full without scraping the metrics endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        queue_depth: state.jobs.queue_depth(),
    })
}

/// Build the health router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
