//! Listing page extraction

use crate::config::ListingSelectors;
use crate::extract::markup::{HtmlDocument, MarkupQuery};
use url::Url;

/// What a single listing page yields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Absolute detail page URLs, in page order
    pub references: Vec<String>,

    /// Whether the "active page" marker was present
    pub has_more: bool,
}

/// Extracts item references and the pagination marker from a listing document
///
/// Items lacking the reference attribute, or whose value cannot be resolved to an
/// http(s) URL, are skipped.
pub fn extract_listing(
    doc: &dyn MarkupQuery,
    page_url: &Url,
    rules: &ListingSelectors,
) -> ListingPage {
    let references = doc
        .select_all(&rules.item)
        .into_iter()
        .filter_map(|node| {
            let href = node.attr(&rules.reference_attribute)?;
            let resolved = resolve_reference(href, page_url);
            if resolved.is_none() {
                tracing::debug!("Skipping unusable reference '{}' on {}", href, page_url);
            }
            resolved
        })
        .collect();

    ListingPage {
        references,
        has_more: doc.contains(&rules.next_page_marker),
    }
}

/// Parses a listing page body and extracts it in one step
pub fn parse_listing_page(body: &str, page_url: &Url, rules: &ListingSelectors) -> ListingPage {
    let doc = HtmlDocument::parse(body);
    extract_listing(&doc, page_url, rules)
}

/// Resolves a reference against the listing page URL
///
/// Returns None for empty values, fragments, non-HTTP schemes and unparsable URLs.
fn resolve_reference(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}
