// crates/db/src/queries/summaries.rs
// Summary storage - one row per recording, replaced by each completed
// summarization job.

use chrono::Utc;

use crate::{Database, DbResult};

/// A summary row as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub recording_id: String,
    pub content: String,
    /// Model identifier the summary was generated with, prefix included.
    pub model: String,
    pub job_id: Option<String>,
    pub updated_at: i64,
}

impl Database {
    /// Insert or replace the summary for a recording.
    pub async fn upsert_summary(
        &self,
        recording_id: &str,
        content: &str,
        model: &str,
        job_id: &str,
    ) -> DbResult<()> {
        let updated_at = Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO summaries (recording_id, content, model, job_id, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(recording_id) DO UPDATE SET
                content = excluded.content,
                model = excluded.model,
                job_id = excluded.job_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(recording_id)
        .bind(content)
        .bind(model)
        .bind(job_id)
        .bind(updated_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch the summary for a recording.
    pub async fn get_summary(&self, recording_id: &str) -> DbResult<Option<SummaryRow>> {
        let row: Option<(String, String, String, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT recording_id, content, model, job_id, updated_at
            FROM summaries WHERE recording_id = ?1
            "#,
        )
        .bind(recording_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|(recording_id, content, model, job_id, updated_at)| SummaryRow {
            recording_id,
            content,
            model,
            job_id,
            updated_at,
        }))
    }

    /// Delete the summary for a recording. Returns whether a row existed.
    pub async fn clear_summary(&self, recording_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM summaries WHERE recording_id = ?1")
            .bind(recording_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
