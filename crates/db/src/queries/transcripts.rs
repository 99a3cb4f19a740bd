// crates/db/src/queries/transcripts.rs
// Transcript storage - one row per recording, replaced wholesale by each
// completed transcription job.

use std::collections::HashMap;

use chrono::Utc;
use wavescribe_types::TranscriptSegment;

use crate::{Database, DbError, DbResult};

/// A transcript row with its segments decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRow {
    pub recording_id: String,
    pub language: Option<String>,
    pub text: String,
    pub segments: Vec<TranscriptSegment>,
    /// Manual speaker labels (`S1` -> display name), entered after the fact.
    pub speaker_map: Option<HashMap<String, String>>,
    /// The job that produced this transcript.
    pub job_id: Option<String>,
    pub updated_at: i64,
}

impl Database {
    /// Insert or replace the transcript for a recording.
    ///
    /// Replacing also resets `speaker_map`: manual labels refer to the old
    /// segment numbering and would silently mislabel the new transcript.
    pub async fn upsert_transcript(
        &self,
        recording_id: &str,
        language: Option<&str>,
        text: &str,
        segments: &[TranscriptSegment],
        job_id: &str,
    ) -> DbResult<()> {
        let segments_json = serde_json::to_string(segments).map_err(|e| DbError::Json {
            context: "transcript segments",
            source: e,
        })?;
        let updated_at = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO transcripts (recording_id, language, text, segments, speaker_map, job_id, updated_at)
            VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6)
            ON CONFLICT(recording_id) DO UPDATE SET
                language = excluded.language,
                text = excluded.text,
                segments = excluded.segments,
                speaker_map = NULL,
                job_id = excluded.job_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(recording_id)
        .bind(language)
        .bind(text)
        .bind(&segments_json)
        .bind(job_id)
        .bind(updated_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch the transcript for a recording, segments decoded.
    pub async fn get_transcript(&self, recording_id: &str) -> DbResult<Option<TranscriptRow>> {
        let row: Option<(String, Option<String>, String, String, Option<String>, Option<String>, i64)> =
            sqlx::query_as(
                r#"
                SELECT recording_id, language, text, segments, speaker_map, job_id, updated_at
                FROM transcripts WHERE recording_id = ?1
                "#,
            )
            .bind(recording_id)
            .fetch_optional(self.pool())
            .await?;

        let Some((recording_id, language, text, segments, speaker_map, job_id, updated_at)) = row
        else {
            return Ok(None);
        };

        let segments: Vec<TranscriptSegment> =
            serde_json::from_str(&segments).map_err(|e| DbError::Json {
                context: "transcript segments",
                source: e,
            })?;
        let speaker_map: Option<HashMap<String, String>> = speaker_map
            .map(|raw| {
                serde_json::from_str(&raw).map_err(|e| DbError::Json {
                    context: "speaker map",
                    source: e,
                })
            })
            .transpose()?;

        Ok(Some(TranscriptRow {
            recording_id,
            language,
            text,
            segments,
            speaker_map,
            job_id,
            updated_at,
        }))
    }

    /// Delete the transcript for a recording. Returns whether a row existed.
    pub async fn clear_transcript(&self, recording_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM transcripts WHERE recording_id = ?1")
            .bind(recording_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Store manual speaker labels for a transcript. Returns false when the
    /// recording has no transcript to label.
    pub async fn set_speaker_map(
        &self,
        recording_id: &str,
        speakers: &HashMap<String, String>,
    ) -> DbResult<bool> {
        let speakers_json = serde_json::to_string(speakers).map_err(|e| DbError::Json {
            context: "speaker map",
            source: e,
        })?;
        let updated_at = Utc::now().timestamp();

        let result = sqlx::query(
            "UPDATE transcripts SET speaker_map = ?2, updated_at = ?3 WHERE recording_id = ?1",
        )
        .bind(recording_id)
        .bind(&speakers_json)
        .bind(updated_at)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
