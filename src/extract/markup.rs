//! Markup query capability
//!
//! Extraction rules only ever ask a document for "the first node matching a path" or "all
//! nodes matching a path". [`MarkupQuery`] captures exactly that, and [`HtmlDocument`]
//! provides it on top of `scraper`.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

/// An owned snapshot of one matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupNode {
    /// Concatenated, trimmed text content
    pub text: String,

    /// Element attributes
    pub attributes: HashMap<String, String>,
}

impl MarkupNode {
    /// Returns the value of an attribute, if present
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Structural queries over a parsed document
pub trait MarkupQuery {
    /// Returns the first node matching `path`, in document order
    fn select_first(&self, path: &str) -> Option<MarkupNode>;

    /// Returns every node matching `path`, in document order
    fn select_all(&self, path: &str) -> Vec<MarkupNode>;

    /// Returns true if at least one node matches `path`
    fn contains(&self, path: &str) -> bool {
        self.select_first(path).is_some()
    }
}

/// A parsed HTML document queried with CSS selectors
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses a full HTML document
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    fn selector(path: &str) -> Option<Selector> {
        match Selector::parse(path) {
            Ok(selector) => Some(selector),
            Err(_) => {
                // Configured selectors are validated at load time
                tracing::debug!("Ignoring unparsable selector: {}", path);
                None
            }
        }
    }
}

impl MarkupQuery for HtmlDocument {
    fn select_first(&self, path: &str) -> Option<MarkupNode> {
        let selector = Self::selector(path)?;
        self.html.select(&selector).next().map(to_node)
    }

    fn select_all(&self, path: &str) -> Vec<MarkupNode> {
        match Self::selector(path) {
            Some(selector) => self.html.select(&selector).map(to_node).collect(),
            None => Vec::new(),
        }
    }
}

fn to_node(element: ElementRef<'_>) -> MarkupNode {
    let text = element.text().collect::<String>().trim().to_string();
    let attributes = element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    MarkupNode { text, attributes }
}
