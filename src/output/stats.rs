//! Statistics generation from the ingestion database
//!
//! This module provides functionality for extracting and displaying
//! ingestion statistics from the storage layer.

use crate::storage::{JobStore, RunRecord, RunStatus};
use crate::HarvestError;
use std::collections::HashMap;

/// Ingestion statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Total number of committed postings
    pub total_postings: u64,

    /// Number of distinct identifiers marked as seen
    pub distinct_seen_ids: u64,

    /// Count of runs by status
    pub runs_by_status: HashMap<RunStatus, u64>,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,
}

impl HarvestStatistics {
    pub fn total_runs(&self) -> u64 {
        self.runs_by_status.values().sum()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn JobStore) -> Result<HarvestStatistics, HarvestError> {
    let total_postings = storage.count_postings()?;
    let distinct_seen_ids = storage.count_distinct_seen_ids()?;
    let runs_by_status = storage.count_runs_by_status()?;
    let latest_run = storage.get_recent_runs(1)?.into_iter().next();

    Ok(HarvestStatistics {
        total_postings,
        distinct_seen_ids,
        runs_by_status,
        latest_run,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Postings stored: {}", stats.total_postings);
    println!("  Distinct identifiers seen: {}", stats.distinct_seen_ids);
    println!();

    println!("Runs ({}):", stats.total_runs());
    for status in [RunStatus::Completed, RunStatus::Failed, RunStatus::Running] {
        let count = stats.runs_by_status.get(&status).copied().unwrap_or(0);
        println!("  {}: {}", status, count);
    }
    println!();

    if let Some(run) = &stats.latest_run {
        println!("Latest Run (#{}):", run.id);
        println!("  Status: {}", run.status);
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Attempts: {}", run.attempts);
        println!("  New postings: {}", run.postings_committed);
        if let Some(message) = &run.error_message {
            println!("  Error: {}", message);
        }
    }
}
