//! Crawler module for the network-facing stages
//!
//! This module contains:
//! - HTTP fetching and failure classification
//! - The listing walker (tolerant of per-page failures)
//! - The detail fetcher (fails on the first bad page)

mod details;
mod fetcher;
mod walker;

pub use details::fetch_details;
pub use fetcher::{build_http_client, fetch_page, user_agent_string, FetchResult};
pub use walker::{listing_page_url, walk_listings, ListingWalk};
