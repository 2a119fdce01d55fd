//! Integration tests for ingestion runs
//!
//! These tests use wiremock to stand in for the listing site and drive whole runs
//! against an in-memory store.

use job_harvest::config::{
    Config, OutputConfig, RetryConfig, SelectorConfig, SourceConfig, UserAgentConfig,
};
use job_harvest::ingest::{Ingestor, Trigger};
use job_harvest::storage::{
    JobPosting, JobStore, RunRecord, RunStatus, SeenIdentifier, SqliteStorage, StorageError,
    StorageResult,
};
use job_harvest::{HarvestError, RunStage};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at `listing_url`
fn create_test_config(listing_url: &str, max_attempts: u32) -> Config {
    Config {
        source: SourceConfig {
            listing_url: listing_url.to_string(),
            max_consecutive_page_failures: 2,
            detail_concurrency: 1,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestHarvester".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: ":memory:".to_string(),
        },
        retry: RetryConfig {
            max_attempts,
            delay_secs: 0,
        },
        selectors: SelectorConfig::default(),
    }
}

fn listing_page(slugs: &[&str], has_more: bool) -> String {
    let items: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<div class="job-description-wrapper" data-href="/offer/{}"><h3>{}</h3></div>"#,
                slug, slug
            )
        })
        .collect();
    let pager = if has_more {
        r#"<ul class="pager"><li class="pager-item active">1</li></ul>"#
    } else {
        ""
    };

    format!("<html><body>{}{}</body></html>", items, pager)
}

fn detail_page(title: &str) -> String {
    format!(
        r#"<html><body>
        <div class="job-adtitle"><h1>{}</h1></div>
        <div class="job-ad-company"><a class="company-title">Acme Ltd</a></div>
        <div class="job-ad-criteria">
            <div class="field-name-field-offre-region"><div class="field-item">Greater Accra</div></div>
            <div class="field-name-field-offre-contrat-type"><div class="field-item">Full time</div></div>
        </div>
        <div class="job-description"><ul><li>Keep the books</li><li>File returns</li></ul></div>
        </body></html>"#,
        title
    )
}

async fn mount_listing(server: &MockServer, page: u32, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_listing_status(server: &MockServer, page: u32, status: u16, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_detail(server: &MockServer, slug: &str, title: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/offer/{}", slug)))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(title)))
        .expect(expected)
        .mount(server)
        .await;
}

fn seeded_store(ids: &[&str]) -> SqliteStorage {
    let mut store = SqliteStorage::new_in_memory().expect("in-memory store");
    let seen: Vec<SeenIdentifier> = ids
        .iter()
        .map(|id| SeenIdentifier { id: id.to_string() })
        .collect();
    store.commit(&[], &seen).expect("seed seen identifiers");
    store
}

fn ids(values: &[&str]) -> HashSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn test_walk_stops_when_marker_disappears() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_page(&["clerk-1"], true), 1).await;
    mount_listing(&server, 2, listing_page(&["clerk-2"], true), 1).await;
    mount_listing(&server, 3, listing_page(&["clerk-3"], false), 1).await;
    mount_listing(&server, 4, listing_page(&["clerk-4"], false), 0).await;
    for (slug, title) in [("clerk-1", "Clerk 1"), ("clerk-2", "Clerk 2"), ("clerk-3", "Clerk 3")] {
        mount_detail(&server, slug, title, 1).await;
    }

    let config = create_test_config(&format!("{}/jobs", server.uri()), 1);
    let mut ingestor = Ingestor::new(&config, SqliteStorage::new_in_memory().unwrap(), "hash")
        .expect("Failed to create ingestor");

    let summary = ingestor.run().await.expect("run should succeed");
    assert_eq!(summary.report.references_found, 3);
    assert_eq!(summary.report.committed, 3);
    assert_eq!(ingestor.stage(), RunStage::Idle);
}

#[tokio::test]
async fn test_only_novel_postings_are_fetched_and_committed() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        1,
        listing_page(&["accountant-1001", "driver-1002"], true),
        2,
    )
    .await;
    mount_listing(&server, 2, listing_page(&["nurse-1003"], false), 2).await;
    mount_detail(&server, "accountant-1001", "Accountant", 0).await;
    mount_detail(&server, "driver-1002", "Driver", 1).await;
    mount_detail(&server, "nurse-1003", "Nurse", 1).await;

    let config = create_test_config(&format!("{}/jobs", server.uri()), 1);
    let mut ingestor = Ingestor::new(&config, seeded_store(&["1001"]), "hash").unwrap();

    let first = ingestor.run().await.expect("first run should succeed");
    assert_eq!(first.report.references_found, 3);
    assert_eq!(first.report.novel_urls, 2);
    assert_eq!(first.report.committed, 2);

    let store = ingestor.store();
    assert_eq!(store.load_seen_ids().unwrap(), ids(&["1001", "1002", "1003"]));

    let postings = store.get_postings().unwrap();
    assert_eq!(postings.len(), 2);
    assert_eq!(postings[0].id, "1002");
    assert_eq!(postings[0].source_url, format!("{}/offer/driver-1002", server.uri()));
    assert_eq!(postings[0].title.as_deref(), Some("Driver"));
    assert_eq!(postings[0].employer_name.as_deref(), Some("Acme Ltd"));
    assert_eq!(postings[0].location.as_deref(), Some("Greater Accra"));
    assert_eq!(postings[0].employment_type.as_deref(), Some("Full time"));
    assert_eq!(postings[0].years_of_experience, None);
    assert_eq!(
        postings[0].description.as_deref(),
        Some("Keep the books\nFile returns")
    );
    assert_eq!(postings[0].requirements, None);
    assert_eq!(postings[1].id, "1003");

    // Nothing is new the second time around: no detail fetches, no writes
    let second = ingestor.run().await.expect("second run should succeed");
    assert_eq!(second.report.novel_urls, 0);
    assert_eq!(second.report.committed, 0);
    assert_eq!(ingestor.store().count_postings().unwrap(), 2);
}

#[tokio::test]
async fn test_failed_listing_page_is_skipped() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_page(&["cook-11"], true), 1).await;
    mount_listing_status(&server, 2, 500, 1).await;
    mount_listing(&server, 3, listing_page(&["cook-13"], false), 1).await;
    mount_detail(&server, "cook-11", "Cook", 1).await;
    mount_detail(&server, "cook-13", "Head Cook", 1).await;

    let config = create_test_config(&format!("{}/jobs", server.uri()), 1);
    let mut ingestor = Ingestor::new(&config, SqliteStorage::new_in_memory().unwrap(), "hash").unwrap();

    let summary = ingestor.run().await.expect("run should succeed");
    assert_eq!(summary.report.listing_pages_failed, 1);
    assert_eq!(summary.report.committed, 2);
    assert_eq!(ingestor.store().load_seen_ids().unwrap(), ids(&["11", "13"]));
}

#[tokio::test]
async fn test_walk_gives_up_after_consecutive_failures() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_page(&["porter-21"], true), 1).await;
    mount_listing_status(&server, 2, 503, 1).await;
    mount_listing_status(&server, 3, 503, 1).await;
    mount_listing(&server, 4, listing_page(&["porter-24"], false), 0).await;
    mount_detail(&server, "porter-21", "Porter", 1).await;

    let config = create_test_config(&format!("{}/jobs", server.uri()), 1);
    let mut ingestor = Ingestor::new(&config, SqliteStorage::new_in_memory().unwrap(), "hash").unwrap();

    let summary = ingestor.run().await.expect("run should succeed");
    assert_eq!(summary.report.listing_pages_failed, 2);
    assert_eq!(summary.report.committed, 1);
}

#[tokio::test]
async fn test_failed_detail_fetch_retries_then_gives_up_without_writes() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_page(&["guard-2001", "guard-2002"], false), 3).await;
    mount_detail(&server, "guard-2001", "Guard", 3).await;
    Mock::given(method("GET"))
        .and(path("/offer/guard-2002"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let config = create_test_config(&format!("{}/jobs", server.uri()), 3);
    let mut ingestor = Ingestor::new(&config, SqliteStorage::new_in_memory().unwrap(), "hash").unwrap();

    let err = ingestor.run().await.expect_err("run should fail");
    match err {
        HarvestError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, HarvestError::Status { status: 500, .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(ingestor.stage(), RunStage::Failed);

    let store = ingestor.store();
    assert_eq!(store.count_postings().unwrap(), 0);
    assert!(store.load_seen_ids().unwrap().is_empty());

    let run = &store.get_recent_runs(1).unwrap()[0];
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.attempts, 3);
    assert!(run.error_message.is_some());
}

/// Store whose first `failures` commits fail before writing anything
struct FlakyStore {
    inner: SqliteStorage,
    failures: u32,
}

impl JobStore for FlakyStore {
    fn load_seen_ids(&self) -> StorageResult<HashSet<String>> {
        self.inner.load_seen_ids()
    }

    fn commit(&mut self, postings: &[JobPosting], seen: &[SeenIdentifier]) -> StorageResult<()> {
        if self.failures > 0 {
            self.failures -= 1;
            let io_error = rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR);
            return Err(StorageError::Sqlite(rusqlite::Error::SqliteFailure(
                io_error,
                Some("disk I/O error".to_string()),
            )));
        }
        self.inner.commit(postings, seen)
    }

    fn get_postings(&self) -> StorageResult<Vec<JobPosting>> {
        self.inner.get_postings()
    }

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        self.inner.create_run(config_hash)
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.inner.get_run(run_id)
    }

    fn get_recent_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>> {
        self.inner.get_recent_runs(limit)
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        attempts: u32,
        postings_committed: usize,
    ) -> StorageResult<()> {
        self.inner.complete_run(run_id, attempts, postings_committed)
    }

    fn fail_run(&mut self, run_id: i64, attempts: u32, error_message: &str) -> StorageResult<()> {
        self.inner.fail_run(run_id, attempts, error_message)
    }

    fn count_postings(&self) -> StorageResult<u64> {
        self.inner.count_postings()
    }

    fn count_distinct_seen_ids(&self) -> StorageResult<u64> {
        self.inner.count_distinct_seen_ids()
    }

    fn count_runs_by_status(&self) -> StorageResult<HashMap<RunStatus, u64>> {
        self.inner.count_runs_by_status()
    }
}

#[tokio::test]
async fn test_commit_failure_is_retried_from_scratch() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_page(&["welder-31"], false), 2).await;
    mount_detail(&server, "welder-31", "Welder", 2).await;

    let store = FlakyStore {
        inner: SqliteStorage::new_in_memory().unwrap(),
        failures: 1,
    };
    let config = create_test_config(&format!("{}/jobs", server.uri()), 3);
    let mut ingestor = Ingestor::new(&config, store, "hash").unwrap();

    let summary = ingestor.run().await.expect("second attempt should succeed");
    assert_eq!(summary.attempts, 2);
    assert_eq!(summary.report.committed, 1);

    let store = ingestor.into_store();
    assert_eq!(store.count_postings().unwrap(), 1);
    assert_eq!(store.load_seen_ids().unwrap(), ids(&["31"]));

    let run = store.get_run(summary.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.attempts, 2);
    assert_eq!(run.postings_committed, 1);
}

#[tokio::test]
async fn test_trigger_runs_in_background() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_page(&["tutor-41"], false), 2).await;
    mount_detail(&server, "tutor-41", "Tutor", 1).await;

    let config = create_test_config(&format!("{}/jobs", server.uri()), 1);
    let ingestor = Ingestor::new(&config, SqliteStorage::new_in_memory().unwrap(), "hash").unwrap();
    let trigger = Trigger::new(ingestor);

    let first = trigger.fire();
    let second = trigger.fire();
    assert_eq!(first.sequence(), 1);
    assert_eq!(second.sequence(), 2);

    let first = first.wait().await.expect("first run should succeed");
    let second = second.wait().await.expect("second run should succeed");
    assert_eq!(first.report.committed + second.report.committed, 1);

    let (postings, runs) = trigger
        .inspect(|store| {
            (
                store.count_postings().unwrap(),
                store.count_runs_by_status().unwrap(),
            )
        })
        .await;
    assert_eq!(postings, 1);
    assert_eq!(runs.get(&RunStatus::Completed), Some(&2));
}

#[tokio::test]
async fn test_concurrent_detail_fetches_keep_listing_order() {
    let server = MockServer::start().await;
    let slugs = ["analyst-1", "analyst-2", "analyst-3", "analyst-4"];
    mount_listing(&server, 1, listing_page(&slugs, false), 1).await;

    // Later URLs answer first
    for (slug, delay_ms) in slugs.iter().zip([200u64, 150, 100, 50]) {
        Mock::given(method("GET"))
            .and(path(format!("/offer/{}", slug)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(detail_page(slug))
                    .set_delay(Duration::from_millis(delay_ms)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&format!("{}/jobs", server.uri()), 1);
    config.source.detail_concurrency = 4;
    let mut ingestor = Ingestor::new(&config, SqliteStorage::new_in_memory().unwrap(), "hash").unwrap();

    let summary = ingestor.run().await.expect("run should succeed");
    assert_eq!(summary.report.committed, 4);

    let committed: Vec<String> = ingestor
        .store()
        .get_postings()
        .unwrap()
        .into_iter()
        .map(|posting| posting.id)
        .collect();
    assert_eq!(committed, vec!["1", "2", "3", "4"]);
}

#[tokio::test]
async fn test_zero_failure_cap_keeps_walking() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_page(&["mason-51"], true), 1).await;
    for page in 2..=7 {
        mount_listing_status(&server, page, 502, 1).await;
    }
    mount_listing(&server, 8, listing_page(&["mason-58"], false), 1).await;
    mount_detail(&server, "mason-51", "Mason", 1).await;
    mount_detail(&server, "mason-58", "Head Mason", 1).await;

    let mut config = create_test_config(&format!("{}/jobs", server.uri()), 1);
    config.source.max_consecutive_page_failures = 0;
    let mut ingestor = Ingestor::new(&config, SqliteStorage::new_in_memory().unwrap(), "hash").unwrap();

    let summary = ingestor.run().await.expect("run should succeed");
    assert_eq!(summary.report.listing_pages_failed, 6);
    assert_eq!(ingestor.store().load_seen_ids().unwrap(), ids(&["51", "58"]));
}

#[tokio::test]
async fn test_listing_url_with_empty_page_parameter() {
    let server = MockServer::start().await;
    mount_listing(&server, 1, listing_page(&["baker-61"], false), 1).await;
    mount_detail(&server, "baker-61", "Baker", 1).await;

    let config = create_test_config(&format!("{}/jobs?page=", server.uri()), 1);
    let mut ingestor = Ingestor::new(&config, SqliteStorage::new_in_memory().unwrap(), "hash").unwrap();

    let summary = ingestor.run().await.expect("run should succeed");
    assert_eq!(summary.report.committed, 1);

    let requests = server.received_requests().await.expect("recording is enabled");
    let listing_query: Vec<Option<String>> = requests
        .iter()
        .filter(|request| request.url.path() == "/jobs")
        .map(|request| request.url.query().map(str::to_string))
        .collect();
    assert_eq!(listing_query, vec![Some("page=1".to_string())]);
}
