//! A fetched page with duck-typed markup queries.

use scraper::{Html, Selector};
use std::sync::OnceLock;

/// A delivered page, queried through owned-result methods so callers never
/// hold parse-tree references. The underlying DOM is re-parsed per query;
/// each strategy queries a handful of times, so this stays cheap relative to
/// the network fetch that produced the page.
#[derive(Debug)]
pub struct FetchedDocument {
    html: String,
    text: OnceLock<String>,
}

impl FetchedDocument {
    /// Wraps a raw HTML body.
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into(), text: OnceLock::new() }
    }

    /// Raw HTML as delivered.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// True if at least one element matches.
    pub fn matches(&self, selector: &Selector) -> bool {
        Html::parse_document(&self.html).select(selector).next().is_some()
    }

    /// Number of matching elements.
    pub fn count(&self, selector: &Selector) -> usize {
        Html::parse_document(&self.html).select(selector).count()
    }

    /// Text content of the first matching element.
    pub fn first_text(&self, selector: &Selector) -> Option<String> {
        Html::parse_document(&self.html)
            .select(selector)
            .next()
            .map(|e| e.text().collect::<String>())
    }

    /// Text contents of all matching elements.
    pub fn all_texts(&self, selector: &Selector) -> Vec<String> {
        Html::parse_document(&self.html)
            .select(selector)
            .map(|e| e.text().collect::<String>())
            .collect()
    }

    /// Attribute values of all matching elements.
    pub fn attr_values(&self, selector: &Selector, attr: &str) -> Vec<String> {
        Html::parse_document(&self.html)
            .select(selector)
            .filter_map(|e| e.value().attr(attr).map(String::from))
            .collect()
    }

    /// Full rendered text, lowercased for phrase matching. Cached after the
    /// first call.
    pub fn lowercased_text(&self) -> &str {
        self.text.get_or_init(|| {
            let document = Html::parse_document(&self.html);
            document.root_element().text().collect::<String>().to_lowercase()
        })
    }
}
