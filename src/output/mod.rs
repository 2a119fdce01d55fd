//! Output module for reporting on stored ingestion data

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
