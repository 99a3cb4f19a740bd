// crates/server/src/routes/metrics.rs
//! Prometheus scrape endpoint.
//!
//! - GET /metrics - Render all recorded metrics in Prometheus text format

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::metrics::render_metrics;
use crate::state::AppState;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics - Prometheus scrape target.
///
/// 503 until `init_metrics` has installed the recorder; a scraper hitting
/// the endpoint during startup retries rather than storing an empty sample.
async fn scrape_metrics() -> Response {
    let Some(rendered) = render_metrics() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Metrics not initialized").into_response();
    };
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        rendered,
    )
        .into_response()
}

/// Build the metrics router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/metrics", get(scrape_metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobService;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;
    use wavescribe_db::Database;

    #[tokio::test]
    async fn test_scrape_includes_job_counters() {
        crate::metrics::init_metrics();
        crate::metrics::record_job_submitted("transcription");

        let db = Database::new_in_memory().await.expect("in-memory DB");
        let (jobs, _rx) = JobService::new(8);
        let app = router().with_state(crate::state::AppState::new(db, jobs));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(
            text.contains("jobs_submitted_total"),
            "scrape output missing job counter: {text}"
        );
    }
}
