//! Novelty filtering against the pre-run seen snapshot

use crate::ingest::identity::derive_id;
use std::collections::{HashMap, HashSet};

/// Identifiers and URLs that have not been ingested before
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NovelSet {
    /// Distinct novel identifiers, in first-seen order
    pub novel_ids: Vec<String>,

    /// Candidate URLs whose identifier is novel, in candidate order
    pub novel_urls: Vec<String>,
}

impl NovelSet {
    pub fn is_empty(&self) -> bool {
        self.novel_urls.is_empty()
    }
}

/// Computes `candidate_ids − seen` and selects the candidate URLs that map into it
///
/// Duplicates are only checked against `seen`, never against each other: several URLs
/// deriving the same novel identifier are all returned. Such collisions are logged so they
/// can be looked at, but they are not filtered.
pub fn filter_novel(
    candidate_urls: &[String],
    candidate_ids: &[String],
    seen: &HashSet<String>,
) -> NovelSet {
    let mut novel_lookup: HashSet<&str> = HashSet::new();
    let mut novel_ids = Vec::new();
    for id in candidate_ids {
        if !seen.contains(id) && novel_lookup.insert(id.as_str()) {
            novel_ids.push(id.clone());
        }
    }

    let novel_urls: Vec<String> = candidate_urls
        .iter()
        .filter(|url| novel_lookup.contains(derive_id(url)))
        .cloned()
        .collect();

    let mut per_id: HashMap<&str, usize> = HashMap::new();
    for url in &novel_urls {
        *per_id.entry(derive_id(url)).or_default() += 1;
    }
    for (id, count) in per_id.into_iter().filter(|(_, count)| *count > 1) {
        tracing::warn!(
            "Identifier '{}' is shared by {} novel URLs; all will be ingested",
            id,
            count
        );
    }

    NovelSet {
        novel_ids,
        novel_urls,
    }
}
