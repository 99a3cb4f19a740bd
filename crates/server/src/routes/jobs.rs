// crates/server/src/routes/jobs.rs
//! API routes for job submission and lifecycle management.
//!
//! - POST   /jobs        - Submit a transcription or summarization job
//! - GET    /jobs        - List jobs (`?active=true` narrows and enriches)
//! - GET    /jobs/{id}   - Fetch one job
//! - DELETE /jobs/{id}   - Terminate a pending or processing job

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use wavescribe_core::{ProviderSpec, SummarizeParams, TranscribeParams};
use wavescribe_types::{ActiveJob, JobId, JobKind, JobView};

use crate::error::{ApiError, ApiResult};
use crate::jobs::JobParams;
use crate::state::AppState;

/// Title shown for an active job whose recording row cannot be resolved.
const UNKNOWN_RECORDING_TITLE: &str = "(unknown recording)";

// ============================================================================
// Request / Response Types
// ============================================================================

/// Request body for POST /jobs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobRequest {
    /// Which pipeline to run: "transcription" or "summarization"
    pub kind: String,
    pub recording_id: String,
    /// Engine parameters, shaped by `kind`.
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
}

/// Summarization parameters as they arrive on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummarizeRequestParams {
    /// Model identifier; an `ollama:` prefix selects the local backend.
    model: Option<String>,
    prompt: Option<String>,
}

/// Response for POST /jobs (202 Accepted).
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    pub job_id: JobId,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /jobs - Submit a job for a known recording.
async fn submit_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitJobRequest>,
) -> ApiResult<impl IntoResponse> {
    let kind: JobKind = body.kind.parse().map_err(|_| {
        ApiError::BadRequest("kind must be 'transcription' or 'summarization'".to_string())
    })?;

    // Reject unknown recordings before anything touches the queue.
    if !state.db.recording_exists(&body.recording_id).await? {
        return Err(ApiError::BadRequest(format!(
            "unknown recording: {}",
            body.recording_id
        )));
    }

    let params = parse_params(kind, body.parameters)?;
    let view = state.jobs.submit(kind, &body.recording_id, params)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitJobResponse { job_id: view.id }),
    ))
}

/// Validate the `parameters` object against the job kind.
fn parse_params(kind: JobKind, raw: Option<serde_json::Value>) -> Result<JobParams, ApiError> {
    let raw = raw.unwrap_or_else(|| serde_json::json!({}));
    match kind {
        JobKind::Transcription => {
            let params: TranscribeParams = serde_json::from_value(raw).map_err(|e| {
                ApiError::BadRequest(format!("invalid transcription parameters: {e}"))
            })?;
            Ok(JobParams::Transcription(params))
        }
        JobKind::Summarization => {
            let params: SummarizeRequestParams = serde_json::from_value(raw).map_err(|e| {
                ApiError::BadRequest(format!("invalid summarization parameters: {e}"))
            })?;
            let model = params.model.ok_or_else(|| {
                ApiError::BadRequest(
                    "parameters.model is required for summarization jobs".to_string(),
                )
            })?;
            Ok(JobParams::Summarization(SummarizeParams {
                provider: ProviderSpec::parse(&model),
                prompt: params.prompt,
            }))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListJobsQuery {
    #[serde(default)]
    active: Option<bool>,
}

/// GET /jobs - List jobs, newest first.
async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListJobsQuery>,
) -> ApiResult<Response> {
    if query.active.unwrap_or(false) {
        let views = state.jobs.list_active();
        let mut jobs = Vec::with_capacity(views.len());
        for view in views {
            let recording_title = lookup_title(&state, &view.recording_id).await;
            jobs.push(ActiveJob {
                job: view,
                recording_title,
            });
        }
        return Ok(Json(jobs).into_response());
    }

    Ok(Json(state.jobs.list()).into_response())
}

/// Enrichment must not fail the listing: a vanished recording or a read
/// error degrades to a placeholder title.
async fn lookup_title(state: &AppState, recording_id: &str) -> String {
    match state.db.get_recording_title(recording_id).await {
        Ok(Some(title)) => title,
        Ok(None) => UNKNOWN_RECORDING_TITLE.to_string(),
        Err(e) => {
            tracing::warn!(recording_id, error = %e, "Failed to look up recording title");
            UNKNOWN_RECORDING_TITLE.to_string()
        }
    }
}

/// GET /jobs/{id} - Fetch one job.
async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobView>> {
    let id = parse_job_id(&id)?;
    let view = state.jobs.get(id).ok_or(ApiError::JobNotFound(id))?;
    Ok(Json(view))
}

/// DELETE /jobs/{id} - Terminate a pending or processing job.
async fn terminate_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<JobView>> {
    let id = parse_job_id(&id)?;
    let view = state.jobs.terminate(id)?;
    Ok(Json(view))
}

fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid job id: {raw}")))
}

/// Build the jobs router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", get(list_jobs).post(submit_job))
        .route("/jobs/{id}", get(get_job).delete(terminate_job))
}
