//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the JobStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{JobStore, StorageError, StorageResult};
use crate::storage::{JobPosting, RunRecord, RunStatus, SeenIdentifier};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, attempts,
     postings_committed, error_message";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path` and initializes the schema
    ///
    /// Missing parent directories are created.
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Failed),
        attempts: row.get(5)?,
        postings_committed: row.get::<_, i64>(6)? as u64,
        error_message: row.get(7)?,
    })
}

fn row_to_posting(row: &Row<'_>) -> rusqlite::Result<JobPosting> {
    let created_at: String = row.get(10)?;
    let created_at = created_at
        .parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;

    Ok(JobPosting {
        id: row.get(0)?,
        source_url: row.get(1)?,
        title: row.get(2)?,
        employer_name: row.get(3)?,
        location: row.get(4)?,
        employment_type: row.get(5)?,
        years_of_experience: row.get(6)?,
        academic_qualification: row.get(7)?,
        description: row.get(8)?,
        requirements: row.get(9)?,
        created_at,
    })
}

impl JobStore for SqliteStorage {
    // ===== Ingestion =====

    fn load_seen_ids(&self) -> StorageResult<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT DISTINCT id FROM seen_ids")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(ids)
    }

    fn commit(&mut self, postings: &[JobPosting], seen: &[SeenIdentifier]) -> StorageResult<()> {
        // Dropping the transaction without commit() rolls it back
        let tx = self.conn.transaction()?;

        {
            let mut insert_posting = tx.prepare(
                "INSERT INTO job_postings (id, source_url, title, employer_name, location,
                 employment_type, years_of_experience, academic_qualification, description,
                 requirements, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for posting in postings {
                insert_posting.execute(params![
                    posting.id,
                    posting.source_url,
                    posting.title,
                    posting.employer_name,
                    posting.location,
                    posting.employment_type,
                    posting.years_of_experience,
                    posting.academic_qualification,
                    posting.description,
                    posting.requirements,
                    posting.created_at.to_rfc3339(),
                ])?;
            }

            let mut insert_seen = tx.prepare("INSERT INTO seen_ids (id) VALUES (?1)")?;
            for identifier in seen {
                insert_seen.execute(params![identifier.id])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_postings(&self) -> StorageResult<Vec<JobPosting>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_url, title, employer_name, location, employment_type,
             years_of_experience, academic_qualification, description, requirements, created_at
             FROM job_postings ORDER BY row_id ASC",
        )?;

        let postings = stmt
            .query_map([], row_to_posting)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(postings)
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], row_to_run)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StorageError::RunNotFound(run_id),
                other => StorageError::Sqlite(other),
            })
    }

    fn get_recent_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT ?1", RUN_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let runs = stmt
            .query_map(params![limit], row_to_run)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        attempts: u32,
        postings_committed: usize,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, attempts = ?3, postings_committed = ?4
             WHERE id = ?5",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                attempts,
                postings_committed as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn fail_run(
        &mut self,
        run_id: i64,
        attempts: u32,
        error_message: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, attempts = ?3, error_message = ?4
             WHERE id = ?5",
            params![
                RunStatus::Failed.to_db_string(),
                now,
                attempts,
                error_message,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Statistics =====

    fn count_postings(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM job_postings", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_distinct_seen_ids(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT id) FROM seen_ids", [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }

    fn count_runs_by_status(&self) -> StorageResult<HashMap<RunStatus, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM runs GROUP BY status")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut summary = HashMap::new();
        for row in rows {
            let (status, count) = row?;
            if let Some(status) = RunStatus::from_db_string(&status) {
                summary.insert(status, count as u64);
            }
        }

        Ok(summary)
    }
}
