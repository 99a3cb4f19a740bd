// crates/db/src/queries/recordings.rs
// Recording CRUD - audio files jobs are submitted against.

use crate::{Database, DbResult};

/// A recording row as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingRow {
    pub id: String,
    pub title: String,
    pub audio_path: String,
    pub duration_secs: Option<f64>,
    pub created_at: i64,
}

impl Database {
    /// Insert a new recording.
    pub async fn insert_recording(
        &self,
        id: &str,
        title: &str,
        audio_path: &str,
        duration_secs: Option<f64>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO recordings (id, title, audio_path, duration_secs)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(audio_path)
        .bind(duration_secs)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Fetch one recording by id.
    pub async fn get_recording(&self, id: &str) -> DbResult<Option<RecordingRow>> {
        let row: Option<(String, String, String, Option<f64>, i64)> = sqlx::query_as(
            "SELECT id, title, audio_path, duration_secs, created_at FROM recordings WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|(id, title, audio_path, duration_secs, created_at)| RecordingRow {
            id,
            title,
            audio_path,
            duration_secs,
            created_at,
        }))
    }

    /// Fetch just the title of a recording. Cheaper than [`get_recording`]
    /// for list enrichment.
    ///
    /// [`get_recording`]: Database::get_recording
    pub async fn get_recording_title(&self, id: &str) -> DbResult<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT title FROM recordings WHERE id = ?1")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(|(title,)| title))
    }

    /// Whether a recording with this id exists.
    pub async fn recording_exists(&self, id: &str) -> DbResult<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recordings WHERE id = ?1")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(row.0 > 0)
    }

    /// All recordings, newest first.
    pub async fn list_recordings(&self) -> DbResult<Vec<RecordingRow>> {
        let rows: Vec<(String, String, String, Option<f64>, i64)> = sqlx::query_as(
            r#"
            SELECT id, title, audio_path, duration_secs, created_at
            FROM recordings
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, audio_path, duration_secs, created_at)| RecordingRow {
                id,
                title,
                audio_path,
                duration_secs,
                created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get_recording() {
        let db = Database::new_in_memory().await.unwrap();

        db.insert_recording("rec-1", "Standup 08-26", "/audio/standup.wav", Some(312.4))
            .await
            .unwrap();

        let rec = db.get_recording("rec-1").await.unwrap().unwrap();
        assert_eq!(rec.title, "Standup 08-26");
        assert_eq!(rec.audio_path, "/audio/standup.wav");
        assert_eq!(rec.duration_secs, Some(312.4));
        assert!(rec.created_at > 0);

        assert!(db.recording_exists("rec-1").await.unwrap());
        assert!(!db.recording_exists("rec-2").await.unwrap());
        assert_eq!(
            db.get_recording_title("rec-1").await.unwrap().as_deref(),
            Some("Standup 08-26")
        );
        assert_eq!(db.get_recording_title("rec-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let db = Database::new_in_memory().await.unwrap();

        db.insert_recording("rec-1", "First", "/a.wav", None)
            .await
            .unwrap();
        let err = db.insert_recording("rec-1", "Second", "/b.wav", None).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_list_recordings_ordering() {
        let db = Database::new_in_memory().await.unwrap();

        // created_at comes from strftime with 1s resolution; inserted in one
        // tick they share a timestamp and fall back to id order.
        db.insert_recording("rec-b", "B", "/b.wav", None).await.unwrap();
        db.insert_recording("rec-a", "A", "/a.wav", None).await.unwrap();

        let all = db.list_recordings().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "rec-a");
        assert_eq!(all[1].id, "rec-b");
    }
}
