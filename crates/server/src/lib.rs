// crates/server/src/lib.rs
//! Wavescribe HTTP server.
//!
//! REST API over recordings and the transcription/summarization jobs that
//! run against them, an SSE feed of per-job progress, and Prometheus
//! metrics. The job pipeline itself lives in [`jobs`]; route handlers only
//! translate HTTP to calls on [`jobs::JobService`] and the database.

pub mod config;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::{ServerConfig, DEFAULT_PORT};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use metrics::{init_metrics, render_metrics};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Assemble the full application router.
///
/// CORS is wide open: the server binds to loopback only, and the recording
/// UI is served from an arbitrary dev port during development.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api_routes(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobReceiver, JobService};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tower::ServiceExt;
    use wavescribe_db::Database;

    async fn full_app() -> (Router, JobReceiver) {
        let db = Database::new_in_memory().await.expect("in-memory DB");
        db.insert_recording("rec-1", "Standup", "/audio/standup.wav", Some(600.0))
            .await
            .expect("seed recording");
        let (jobs, rx) = JobService::new(8);
        (create_app(AppState::new(db, jobs)), rx)
    }

    async fn request(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_submit_and_fetch_through_full_app() {
        let (app, _rx) = full_app().await;

        let (status, json) = request(
            app.clone(),
            Method::POST,
            "/jobs",
            Some(serde_json::json!({"kind": "transcription", "recordingId": "rec-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let job_id = json["jobId"].as_str().expect("submit returns jobId").to_string();

        let (status, json) = request(app, Method::GET, &format!("/jobs/{job_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["kind"], "transcription");
    }

    #[tokio::test]
    async fn test_health_reachable_through_layers() {
        let (app, _rx) = full_app().await;
        let (status, json) = request(app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert!(json["queue_depth"].is_number());
    }

    #[tokio::test]
    async fn test_preflight_allows_any_origin() {
        let (app, _rx) = full_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/jobs")
                    .header("origin", "http://localhost:5173")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let allowed = response
            .headers()
            .get("access-control-allow-origin")
            .expect("preflight carries allow-origin");
        assert_eq!(allowed, "*");
    }

    #[tokio::test]
    async fn test_unknown_routes_are_404() {
        let (app, _rx) = full_app().await;
        for uri in ["/", "/api/jobs", "/jobs/extra/deep"] {
            let (status, _) = request(app.clone(), Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "uri {uri}");
        }
    }
}
