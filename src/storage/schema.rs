//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Job-Harvest database.

/// SQL schema for the database
///
/// `seen_ids.id` is deliberately not unique: two postings sharing a derived identifier in
/// one run are both committed, each with its own seen row.
pub const SCHEMA_SQL: &str = r#"
-- Track ingestion runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    postings_committed INTEGER NOT NULL DEFAULT 0,
    error_message TEXT
);

-- Identifiers of postings already ingested
CREATE TABLE IF NOT EXISTS seen_ids (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_seen_ids_id ON seen_ids(id);

-- Extracted postings
CREATE TABLE IF NOT EXISTS job_postings (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL,
    source_url TEXT NOT NULL,
    title TEXT,
    employer_name TEXT,
    location TEXT,
    employment_type TEXT,
    years_of_experience TEXT,
    academic_qualification TEXT,
    description TEXT,
    requirements TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_job_postings_id ON job_postings(id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
