// crates/server/src/routes/recordings.rs
//! API routes for the recording library.
//!
//! - POST /recordings                  - Register a recording
//! - GET  /recordings                  - List recordings, newest first
//! - GET  /recordings/{id}/transcript  - Transcript and summary for a recording
//! - PUT  /recordings/{id}/speakers    - Attach manual speaker labels

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use wavescribe_db::{RecordingRow, SummaryRow, TranscriptRow};
use wavescribe_types::TranscriptSegment;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

/// Request body for POST /recordings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordingRequest {
    /// Client-supplied id; a UUID is generated when absent.
    pub id: Option<String>,
    pub title: String,
    pub audio_path: String,
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct RecordingResponse {
    pub id: String,
    pub title: String,
    pub audio_path: String,
    pub duration_secs: Option<f64>,
    pub created_at: i64,
}

impl From<RecordingRow> for RecordingResponse {
    fn from(row: RecordingRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            audio_path: row.audio_path,
            duration_secs: row.duration_secs,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptView {
    pub language: Option<String>,
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_map: Option<HashMap<String, String>>,
    pub job_id: Option<String>,
    pub updated_at: i64,
}

impl From<TranscriptRow> for TranscriptView {
    fn from(row: TranscriptRow) -> Self {
        Self {
            language: row.language,
            text: row.text,
            segments: row.segments,
            speaker_map: row.speaker_map,
            job_id: row.job_id,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub content: String,
    pub model: String,
    pub job_id: Option<String>,
    pub updated_at: i64,
}

impl From<SummaryRow> for SummaryView {
    fn from(row: SummaryRow) -> Self {
        Self {
            content: row.content,
            model: row.model,
            job_id: row.job_id,
            updated_at: row.updated_at,
        }
    }
}

/// Response for GET /recordings/{id}/transcript.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingContentResponse {
    pub recording_id: String,
    pub title: String,
    pub transcript: Option<TranscriptView>,
    pub summary: Option<SummaryView>,
}

/// Request body for PUT /recordings/{id}/speakers.
#[derive(Debug, Deserialize)]
pub struct SpeakerMapRequest {
    pub speakers: HashMap<String, String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /recordings - Register a recording the jobs can run against.
async fn create_recording(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRecordingRequest>,
) -> ApiResult<impl IntoResponse> {
    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }
    if body.audio_path.trim().is_empty() {
        return Err(ApiError::BadRequest("audioPath must not be empty".to_string()));
    }

    let id = body.id.unwrap_or_else(|| Uuid::new_v4().to_string());
    if state.db.recording_exists(&id).await? {
        return Err(ApiError::Conflict(format!("recording {} already exists", id)));
    }

    state
        .db
        .insert_recording(&id, &body.title, &body.audio_path, body.duration_secs)
        .await?;

    let row = state
        .db
        .get_recording(&id)
        .await?
        .ok_or_else(|| ApiError::Internal("recording vanished after insert".to_string()))?;

    Ok((StatusCode::CREATED, Json(RecordingResponse::from(row))))
}

/// GET /recordings - List recordings, newest first.
async fn list_recordings(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<RecordingResponse>>> {
    let rows = state.db.list_recordings().await?;
    Ok(Json(rows.into_iter().map(RecordingResponse::from).collect()))
}

/// GET /recordings/{id}/transcript - Transcript and summary, either may be
/// absent while jobs are still running.
async fn get_recording_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<RecordingContentResponse>> {
    let recording = state
        .db
        .get_recording(&id)
        .await?
        .ok_or_else(|| ApiError::RecordingNotFound(id.clone()))?;

    let transcript = state.db.get_transcript(&id).await?.map(TranscriptView::from);
    let summary = state.db.get_summary(&id).await?.map(SummaryView::from);

    Ok(Json(RecordingContentResponse {
        recording_id: recording.id,
        title: recording.title,
        transcript,
        summary,
    }))
}

/// PUT /recordings/{id}/speakers - Attach manual speaker labels to the
/// current transcript.
async fn set_speakers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SpeakerMapRequest>,
) -> ApiResult<Json<TranscriptView>> {
    if !state.db.recording_exists(&id).await? {
        return Err(ApiError::RecordingNotFound(id));
    }

    if !state.db.set_speaker_map(&id, &body.speakers).await? {
        return Err(ApiError::BadRequest(
            "recording has no transcript to label".to_string(),
        ));
    }

    let transcript = state
        .db
        .get_transcript(&id)
        .await?
        .ok_or_else(|| ApiError::Internal("transcript vanished after update".to_string()))?;
    Ok(Json(TranscriptView::from(transcript)))
}

/// Build the recordings router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recordings", get(list_recordings).post(create_recording))
        .route("/recordings/{id}/transcript", get(get_recording_content))
        .route("/recordings/{id}/speakers", put(set_speakers))
}
