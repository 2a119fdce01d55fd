//! State module for tracking run progress
//!
//! - `RunStage`: the stage an ingestion attempt is in, with the allowed transitions

mod run_stage;

pub use run_stage::RunStage;
