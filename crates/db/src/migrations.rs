/// Inline SQL migrations for the wavescribe database schema.
///
/// We use simple inline migrations rather than sqlx migration files
/// because the schema is small and self-contained.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: recordings table
    r#"
CREATE TABLE IF NOT EXISTS recordings (
    id            TEXT PRIMARY KEY,
    title         TEXT NOT NULL,
    audio_path    TEXT NOT NULL,
    duration_secs REAL,
    created_at    INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);
"#,
    r#"CREATE INDEX IF NOT EXISTS idx_recordings_created ON recordings(created_at DESC);"#,
    // Migration 2: transcripts table, one row per recording
    r#"
CREATE TABLE IF NOT EXISTS transcripts (
    recording_id TEXT PRIMARY KEY REFERENCES recordings(id) ON DELETE CASCADE,
    language     TEXT,
    text         TEXT NOT NULL DEFAULT '',
    segments     TEXT NOT NULL DEFAULT '[]',
    speaker_map  TEXT,
    job_id       TEXT,
    updated_at   INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);
"#,
    // Migration 3: summaries table, one row per recording
    r#"
CREATE TABLE IF NOT EXISTS summaries (
    recording_id TEXT PRIMARY KEY REFERENCES recordings(id) ON DELETE CASCADE,
    content      TEXT NOT NULL DEFAULT '',
    model        TEXT NOT NULL DEFAULT '',
    job_id       TEXT,
    updated_at   INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);
"#,
];
