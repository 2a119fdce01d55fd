//! Listing walker
//!
//! Fetches listing pages one at a time, starting at page 1, and keeps going while the
//! most recently parsed page carries the "active page" marker. There is no page cap: a
//! site that always shows the marker is walked forever.

use crate::config::ListingSelectors;
use crate::crawler::fetcher::{fetch_page, FetchResult};
use crate::extract::parse_listing_page;
use crate::HarvestError;
use reqwest::Client;
use url::Url;

/// Everything one listing walk produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingWalk {
    /// Reference URLs from every page, in page order
    pub references: Vec<String>,

    /// Pages requested, successful or not
    pub pages_requested: u32,

    /// Pages that could not be fetched
    pub pages_failed: u32,
}

/// Builds the URL of listing page `page` (1-indexed)
///
/// Any `page` pair already present in `base` is replaced; other query pairs are kept in
/// order.
pub fn listing_page_url(base: &Url, page: u32) -> Url {
    let kept: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_query(None);
    url.query_pairs_mut()
        .extend_pairs(kept)
        .append_pair("page", &page.to_string());
    url
}

/// Walks every listing page and collects item references
///
/// A page that fails to fetch contributes nothing and the walk carries on using the marker
/// seen on the last page that did parse. If page 1 fails there is no marker to go on and
/// the walk stops. After `max_consecutive_failures` failed pages in a row the walk also
/// stops; 0 disables that cap.
///
/// # Errors
///
/// Only an unparsable `base_url`; fetch failures are absorbed.
pub async fn walk_listings(
    client: &Client,
    base_url: &str,
    rules: &ListingSelectors,
    max_consecutive_failures: u32,
) -> Result<ListingWalk, HarvestError> {
    let base = Url::parse(base_url)?;
    let mut walk = ListingWalk::default();
    let mut last_marker: Option<bool> = None;
    let mut consecutive_failures = 0;
    let mut page = 1;

    loop {
        let page_url = listing_page_url(&base, page);
        tracing::info!("Fetching listing page {}", page);
        walk.pages_requested += 1;

        match fetch_page(client, page_url.as_str()).await {
            FetchResult::Success { final_url, body } => {
                let resolve_base = Url::parse(&final_url).unwrap_or_else(|_| page_url.clone());
                let parsed = parse_listing_page(&body, &resolve_base, rules);
                tracing::debug!(
                    "Listing page {} yielded {} references (more pages: {})",
                    page,
                    parsed.references.len(),
                    parsed.has_more
                );

                walk.references.extend(parsed.references);
                last_marker = Some(parsed.has_more);
                consecutive_failures = 0;
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Listing page {} returned HTTP {}", page, status_code);
                walk.pages_failed += 1;
                consecutive_failures += 1;
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Listing page {} could not be fetched: {}", page, error);
                walk.pages_failed += 1;
                consecutive_failures += 1;
            }
        }

        match last_marker {
            None => {
                tracing::warn!("No listing page could be read; ending walk");
                break;
            }
            Some(false) => break,
            Some(true) => {}
        }

        if max_consecutive_failures > 0 && consecutive_failures >= max_consecutive_failures {
            tracing::warn!(
                "{} consecutive listing pages failed; ending walk at page {}",
                consecutive_failures,
                page
            );
            break;
        }

        page += 1;
    }

    tracing::info!(
        "Listing walk finished: {} pages requested, {} failed, {} references",
        walk.pages_requested,
        walk.pages_failed,
        walk.references.len()
    );

    Ok(walk)
}
