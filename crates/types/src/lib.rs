// crates/types/src/lib.rs
//! Shared wire and domain types for the wavescribe server.
//!
//! Everything here is serde-serializable and used across crate boundaries:
//! job identifiers and lifecycle types, progress events streamed over SSE,
//! and the transcript artifact shape the external recognizer writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a job, assigned at submission. Opaque to clients.
pub type JobId = Uuid;

/// The two kinds of background work the pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Transcription,
    Summarization,
}

impl JobKind {
    /// Stable lowercase label, used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Transcription => "transcription",
            JobKind::Summarization => "summarization",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcription" => Ok(JobKind::Transcription),
            "summarization" => Ok(JobKind::Summarization),
            _ => Err(()),
        }
    }
}

/// Lifecycle status of a job.
///
/// `Completed`, `Failed` and `Terminated` are terminal: once a record
/// reaches one of them it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Terminated,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Terminated
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress update delivered to SSE subscribers.
///
/// Ephemeral: events are not retained after delivery, and late subscribers
/// get a current-state snapshot frame instead of a replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub job_id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Completion percentage, 0.0 to 100.0.
    pub progress: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

/// Read-only snapshot of a job record, returned by the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub id: JobId,
    pub kind: JobKind,
    pub recording_id: String,
    pub status: JobStatus,
    pub progress: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An active (non-terminal) job enriched with the recording title for
/// display. The title falls back to a placeholder when the recording row
/// cannot be looked up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveJob {
    #[serde(flatten)]
    pub job: JobView,
    pub recording_title: String,
}

/// One timed segment of a transcript, optionally attributed to a speaker
/// label produced by diarization (e.g. "SPEAKER_00").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    /// Segment start offset in seconds.
    pub start: f64,
    /// Segment end offset in seconds.
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    pub text: String,
}

/// The structured result file the external recognizer writes on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub text: String,
    #[serde(default)]
    pub segments: Vec<TranscriptSegment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_kind_round_trip() {
        assert_eq!("transcription".parse::<JobKind>(), Ok(JobKind::Transcription));
        assert_eq!("summarization".parse::<JobKind>(), Ok(JobKind::Summarization));
        assert!("diarization".parse::<JobKind>().is_err());
        assert_eq!(JobKind::Transcription.to_string(), "transcription");
    }

    #[test]
    fn test_job_status_terminality() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Terminated.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&JobStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn test_progress_event_serializes_camel_case() {
        let event = ProgressEvent {
            job_id: Uuid::nil(),
            kind: JobKind::Transcription,
            status: JobStatus::Processing,
            progress: 42.5,
            message: Some("Transcribing...".to_string()),
            error: None,
            timestamp: "2026-08-01T12:00:00Z".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"jobId\""));
        assert!(json.contains("\"status\":\"processing\""));
        assert!(json.contains("\"progress\":42.5"));
        // None fields are skipped entirely
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_active_job_flattens_view() {
        let job = JobView {
            id: Uuid::nil(),
            kind: JobKind::Summarization,
            recording_id: "rec-1".to_string(),
            status: JobStatus::Pending,
            progress: 0.0,
            error: None,
            created_at: Utc::now(),
        };
        let active = ActiveJob {
            job,
            recording_title: "Weekly sync".to_string(),
        };
        let json = serde_json::to_string(&active).unwrap();
        // Flattened: view fields sit beside the title, not nested
        assert!(json.contains("\"recordingId\":\"rec-1\""));
        assert!(json.contains("\"recordingTitle\":\"Weekly sync\""));
        assert!(!json.contains("\"job\":"));
    }

    #[test]
    fn test_artifact_parses_minimal_shape() {
        let json = r#"{"text": "hello world"}"#;
        let artifact: TranscriptArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.text, "hello world");
        assert!(artifact.language.is_none());
        assert!(artifact.segments.is_empty());
    }

    #[test]
    fn test_artifact_parses_full_shape() {
        let json = r#"{
            "language": "en",
            "text": "hello world",
            "segments": [
                {"start": 0.0, "end": 1.5, "speaker": "SPEAKER_00", "text": "hello"},
                {"start": 1.5, "end": 2.0, "text": "world"}
            ]
        }"#;
        let artifact: TranscriptArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.language.as_deref(), Some("en"));
        assert_eq!(artifact.segments.len(), 2);
        assert_eq!(artifact.segments[0].speaker.as_deref(), Some("SPEAKER_00"));
        assert!(artifact.segments[1].speaker.is_none());
    }
}
