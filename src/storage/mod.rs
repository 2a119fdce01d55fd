//! Storage module for persisting ingestion data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - The seen-identifier set and the posting collection
//! - Atomic commit of both collections
//! - Run history

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{JobStore, StorageError, StorageResult};

use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// A posting extracted from a detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPosting {
    /// Identifier derived from `source_url`; the dedup key
    pub id: String,
    pub source_url: String,
    pub title: Option<String>,
    pub employer_name: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub years_of_experience: Option<String>,
    pub academic_qualification: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Marks an identifier as processed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeenIdentifier {
    pub id: String,
}

impl From<&JobPosting> for SeenIdentifier {
    fn from(posting: &JobPosting) -> Self {
        Self {
            id: posting.id.clone(),
        }
    }
}

/// Represents an ingestion run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub attempts: u32,
    pub postings_committed: u64,
    pub error_message: Option<String>,
}

/// Status of an ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}
