//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{JobPosting, RunRecord, RunStatus, SeenIdentifier};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The ingestion pipeline only needs two operations: a snapshot of every seen identifier
/// and an atomic append of postings plus their identifiers. The remaining methods cover
/// run bookkeeping and statistics.
pub trait JobStore {
    // ===== Ingestion =====

    /// Returns every identifier recorded so far
    fn load_seen_ids(&self) -> StorageResult<HashSet<String>>;

    /// Appends postings and seen identifiers in one transaction
    ///
    /// Either every row of both collections becomes visible, or none does. Errors are
    /// returned as-is; callers decide whether to retry.
    fn commit(&mut self, postings: &[JobPosting], seen: &[SeenIdentifier]) -> StorageResult<()>;

    /// Returns all committed postings in commit order
    fn get_postings(&self) -> StorageResult<Vec<JobPosting>>;

    // ===== Run Management =====

    /// Creates a new run in the `running` state and returns its ID
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent runs, newest first
    fn get_recent_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>>;

    /// Marks a run as completed
    fn complete_run(
        &mut self,
        run_id: i64,
        attempts: u32,
        postings_committed: usize,
    ) -> StorageResult<()>;

    /// Marks a run as failed with the last error message
    fn fail_run(&mut self, run_id: i64, attempts: u32, error_message: &str)
        -> StorageResult<()>;

    // ===== Statistics =====

    /// Counts committed postings
    fn count_postings(&self) -> StorageResult<u64>;

    /// Counts distinct seen identifiers
    fn count_distinct_seen_ids(&self) -> StorageResult<u64>;

    /// Counts runs grouped by status
    fn count_runs_by_status(&self) -> StorageResult<HashMap<RunStatus, u64>>;
}
