//! Detail page extraction
//!
//! Each field rule is independent: a selector that matches nothing leaves its field as
//! `None` and never fails the record.

use crate::config::DetailSelectors;
use crate::extract::markup::{HtmlDocument, MarkupQuery};
use crate::ingest::derive_id;
use crate::storage::JobPosting;
use chrono::{DateTime, Utc};

/// Builds a posting from a detail document
pub fn extract_posting(
    doc: &dyn MarkupQuery,
    source_url: &str,
    rules: &DetailSelectors,
    created_at: DateTime<Utc>,
) -> JobPosting {
    JobPosting {
        id: derive_id(source_url).to_string(),
        source_url: source_url.to_string(),
        title: first_text(doc, &rules.title),
        employer_name: first_text(doc, &rules.employer),
        location: first_text(doc, &rules.location),
        employment_type: first_text(doc, &rules.employment_type),
        years_of_experience: first_text(doc, &rules.experience),
        academic_qualification: first_text(doc, &rules.qualification),
        description: joined_items(doc, &rules.description_items),
        requirements: joined_items(doc, &rules.requirement_items),
        created_at,
    }
}

/// Parses a detail page body and extracts a posting stamped with the current time
pub fn parse_detail_page(body: &str, source_url: &str, rules: &DetailSelectors) -> JobPosting {
    let doc = HtmlDocument::parse(body);
    extract_posting(&doc, source_url, rules, Utc::now())
}

fn first_text(doc: &dyn MarkupQuery, path: &str) -> Option<String> {
    doc.select_first(path).map(|node| node.text)
}

/// Joins list item texts with newlines; `None` only when no item matched
fn joined_items(doc: &dyn MarkupQuery, path: &str) -> Option<String> {
    let nodes = doc.select_all(path);
    if nodes.is_empty() {
        return None;
    }

    Some(
        nodes
            .into_iter()
            .map(|node| node.text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
    )
}
