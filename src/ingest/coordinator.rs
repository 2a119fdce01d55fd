//! Ingestion coordinator - one run of the discovery pipeline
//!
//! This module orchestrates, in strict sequence:
//! - Walking listing pages to collect reference URLs
//! - Deriving identifiers and filtering against the stored seen set
//! - Fetching detail pages for novel postings
//! - Committing postings and seen identifiers atomically
//!
//! Every intermediate collection is a local value of a single attempt; nothing carries
//! over between attempts or runs except what the store persisted.

use crate::config::{Config, SelectorConfig, SourceConfig};
use crate::crawler::{build_http_client, fetch_details, walk_listings};
use crate::ingest::identity::derive_id;
use crate::ingest::novelty::filter_novel;
use crate::ingest::retry::RetryPolicy;
use crate::state::RunStage;
use crate::storage::{JobStore, SeenIdentifier};
use crate::{HarvestError, Result};
use reqwest::Client;

/// Counts from a single successful attempt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Reference URLs found across all listing pages
    pub references_found: usize,

    /// Listing pages that could not be fetched
    pub listing_pages_failed: u32,

    /// Reference URLs whose identifier was not yet seen
    pub novel_urls: usize,

    /// Postings written by the commit
    pub committed: usize,
}

/// Outcome of a run, including retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub run_id: i64,
    pub attempts: u32,
    pub report: IngestReport,
}

/// Main ingestion coordinator
pub struct Ingestor<S: JobStore> {
    client: Client,
    source: SourceConfig,
    selectors: SelectorConfig,
    retry: RetryPolicy,
    store: S,
    config_hash: String,
    stage: RunStage,
}

impl<S: JobStore> Ingestor<S> {
    /// Creates a new coordinator over `store`
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be built.
    pub fn new(config: &Config, store: S, config_hash: impl Into<String>) -> Result<Self> {
        let client = build_http_client(&config.user_agent)?;

        Ok(Self {
            client,
            source: config.source.clone(),
            selectors: config.selectors.clone(),
            retry: RetryPolicy::from(&config.retry),
            store,
            config_hash: config_hash.into(),
            stage: RunStage::Idle,
        })
    }

    /// Current stage of the in-progress (or last) attempt
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn transition(&mut self, next: RunStage) -> Result<()> {
        if !self.stage.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }

        tracing::info!("Stage {} -> {}", self.stage, next);
        self.stage = next;
        Ok(())
    }

    /// Runs the pipeline with the whole-run retry policy and records the run
    ///
    /// A failed attempt never leaves partial data behind, so retrying simply starts over
    /// from the listing walk.
    ///
    /// # Errors
    ///
    /// `RetriesExhausted` wrapping the last attempt's error once every attempt failed, or a
    /// storage error if the run record cannot be created.
    pub async fn run(&mut self) -> Result<RunSummary> {
        let run_id = self.store.create_run(&self.config_hash)?;
        tracing::info!("Starting ingestion run {}", run_id);

        let mut attempt = 0;
        loop {
            attempt += 1;

            match self.run_once().await {
                Ok(report) => {
                    if let Err(e) = self.store.complete_run(run_id, attempt, report.committed) {
                        tracing::warn!("Run {} committed but could not be recorded: {}", run_id, e);
                    }
                    tracing::info!(
                        "Run {} completed after {} attempt(s): {} new postings",
                        run_id,
                        attempt,
                        report.committed
                    );
                    return Ok(RunSummary {
                        run_id,
                        attempts: attempt,
                        report,
                    });
                }
                Err(e) => {
                    tracing::error!(
                        "Run {} attempt {}/{} failed: {}",
                        run_id,
                        attempt,
                        self.retry.max_attempts,
                        e
                    );

                    if !self.retry.has_attempts_left(attempt) {
                        if let Err(record_err) = self.store.fail_run(run_id, attempt, &e.to_string())
                        {
                            tracing::warn!("Could not record failure of run {}: {}", run_id, record_err);
                        }
                        tracing::error!("Run {} failed after {} attempts", run_id, attempt);
                        return Err(HarvestError::RetriesExhausted {
                            attempts: attempt,
                            last: Box::new(e),
                        });
                    }

                    self.retry.wait().await;
                }
            }
        }
    }

    /// Runs a single attempt of the pipeline without retries
    pub async fn run_once(&mut self) -> Result<IngestReport> {
        self.transition(RunStage::Listing)?;

        let result = self.attempt().await;
        if result.is_err() && self.stage.is_active() {
            tracing::debug!("Stage {} -> {}", self.stage, RunStage::Failed);
            self.stage = RunStage::Failed;
        }
        result
    }

    async fn attempt(&mut self) -> Result<IngestReport> {
        let walk = walk_listings(
            &self.client,
            &self.source.listing_url,
            &self.selectors.listing,
            self.source.max_consecutive_page_failures,
        )
        .await?;

        self.transition(RunStage::Filtering)?;
        let candidate_ids: Vec<String> = walk
            .references
            .iter()
            .map(|url| derive_id(url).to_string())
            .collect();
        let seen = self.store.load_seen_ids()?;
        let novel = filter_novel(&walk.references, &candidate_ids, &seen);

        tracing::info!(
            "{} references found, {} already seen identifiers, {} novel",
            walk.references.len(),
            seen.len(),
            novel.novel_urls.len()
        );

        let mut report = IngestReport {
            references_found: walk.references.len(),
            listing_pages_failed: walk.pages_failed,
            novel_urls: novel.novel_urls.len(),
            committed: 0,
        };

        if novel.is_empty() {
            tracing::info!("No new postings; nothing to commit");
            self.transition(RunStage::Idle)?;
            return Ok(report);
        }

        self.transition(RunStage::FetchingDetails)?;
        let postings = fetch_details(
            &self.client,
            &novel.novel_urls,
            &self.selectors.detail,
            self.source.detail_concurrency,
        )
        .await?;

        self.transition(RunStage::Committing)?;
        let seen_records: Vec<SeenIdentifier> =
            postings.iter().map(SeenIdentifier::from).collect();
        self.store.commit(&postings, &seen_records)?;
        tracing::info!(
            "Committed {} postings and {} seen identifiers",
            postings.len(),
            seen_records.len()
        );

        report.committed = postings.len();
        self.transition(RunStage::Idle)?;
        Ok(report)
    }
}
