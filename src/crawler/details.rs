//! Detail page fetching
//!
//! Unlike the listing walk, any failed detail fetch aborts the whole batch: a partial set
//! of postings is never handed to the commit step.

use crate::config::DetailSelectors;
use crate::crawler::fetcher::fetch_page;
use crate::extract::parse_detail_page;
use crate::storage::JobPosting;
use crate::HarvestError;
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::Client;

/// Fetches and extracts a posting for every URL
///
/// Up to `concurrency` requests are in flight at once (1 means strictly sequential). The
/// returned postings are in the same order as `urls` regardless of completion order.
///
/// # Errors
///
/// The first non-success status or transport failure, with its URL.
pub async fn fetch_details(
    client: &Client,
    urls: &[String],
    rules: &DetailSelectors,
    concurrency: usize,
) -> Result<Vec<JobPosting>, HarvestError> {
    let postings: Vec<JobPosting> = stream::iter(urls)
        .map(move |url| async move {
            tracing::debug!("Fetching detail page {}", url);
            let body = fetch_page(client, url).await.into_body(url)?;
            Ok::<_, HarvestError>(parse_detail_page(&body, url, rules))
        })
        .buffered(concurrency.max(1))
        .boxed()
        .try_collect()
        .await?;

    tracing::info!("Extracted {} postings from detail pages", postings.len());
    Ok(postings)
}
