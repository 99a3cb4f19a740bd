// crates/db/src/lib.rs
// SQLite persistence for wavescribe: recordings, transcripts, summaries.

mod migrations;
mod queries;

pub use queries::recordings::RecordingRow;
pub use queries::summaries::SummaryRow;
pub use queries::transcripts::TranscriptRow;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{ConnectOptions, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Failed to create database directory: {0}")]
    CreateDir(#[from] std::io::Error),

    #[error("Corrupt {context} JSON in database: {source}")]
    Json {
        context: &'static str,
        source: serde_json::Error,
    },
}

pub type DbResult<T> = Result<T, DbError>;

/// Handle over the SQLite pool. Cheap to clone; all clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl Database {
    /// Open the database file, creating it and any parent directories on
    /// first run, and bring the schema up to date.
    pub async fn new(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // WAL with NORMAL sync: readers never block the writer, and a crash
        // loses at most the last checkpoint, which for this data (re-runnable
        // job output) is acceptable.
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30))
            .log_slow_statements(
                tracing::log::LevelFilter::Warn,
                std::time::Duration::from_secs(5),
            );

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            db_path: path.to_owned(),
        };
        db.apply_migrations().await?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// In-memory database for tests. `shared_cache` makes every pool
    /// connection see the same database; without it each connection would
    /// get a private empty one.
    pub async fn new_in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .shared_cache(true)
            .busy_timeout(std::time::Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let db = Self {
            pool,
            db_path: PathBuf::new(),
        };
        db.apply_migrations().await?;
        Ok(db)
    }

    /// Apply any migrations newer than what the `_migrations` table records.
    /// Tracking applied versions lets non-idempotent statements (ALTER TABLE
    /// ADD COLUMN) ship as later migrations.
    async fn apply_migrations(&self) -> DbResult<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS _migrations (version INTEGER PRIMARY KEY)")
            .execute(&self.pool)
            .await?;

        let (applied,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM _migrations")
            .fetch_one(&self.pool)
            .await?;

        for (i, migration) in migrations::MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i64;
            if version <= applied {
                continue;
            }
            match sqlx::query(migration).execute(&self.pool).await {
                Ok(_) => {}
                // A column added by a pre-tracking build of the server.
                Err(e) if e.to_string().contains("duplicate column name") => {}
                Err(e) => return Err(e.into()),
            }
            sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
                .bind(version)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Path of the backing file; empty for in-memory databases.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
