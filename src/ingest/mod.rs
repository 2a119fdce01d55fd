//! Ingestion pipeline
//!
//! Listing walk, novelty filtering, detail fetching and the atomic commit, plus the
//! retry policy and the trigger that fires runs in the background.

mod coordinator;
mod identity;
mod novelty;
mod retry;
mod trigger;

pub use coordinator::{IngestReport, Ingestor, RunSummary};
pub use identity::derive_id;
pub use novelty::{filter_novel, NovelSet};
pub use retry::RetryPolicy;
pub use trigger::{RunTicket, Trigger};
