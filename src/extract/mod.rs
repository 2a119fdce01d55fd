//! Extraction of structured data from listing and detail pages
//!
//! All functions here are synchronous and stateless. Page bodies are parsed and fully
//! reduced to owned values before returning, so no parsed document outlives the call.

mod detail;
mod listing;
mod markup;

pub use detail::{extract_posting, parse_detail_page};
pub use listing::{extract_listing, parse_listing_page, ListingPage};
pub use markup::{HtmlDocument, MarkupNode, MarkupQuery};
