//! Knowledge-base browsing: filter the document list by term, category, and tag.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::models::{Document, ALL};

/// Categories offered when browsing. `all` disables the category filter.
pub const CATEGORIES: &[&str] = &[
    "all",
    "documentation",
    "tutorial",
    "code",
    "reference",
    "article",
    "book",
    "other",
];

/// Browse filters. Empty `term`/`tag` and `category = "all"` match everything.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryFilter {
    #[serde(default, alias = "q")]
    pub term: String,
    #[serde(default = "all")]
    pub category: String,
    #[serde(default)]
    pub tag: String,
}

fn all() -> String {
    ALL.to_string()
}

impl Default for LibraryFilter {
    fn default() -> Self {
        Self {
            term: String::new(),
            category: all(),
            tag: String::new(),
        }
    }
}

/// Documents passing every active filter, in input order.
///
/// - `term`: case-insensitive substring of title, content, or summary.
/// - `category`: exact match unless `all`.
/// - `tag`: case-insensitive substring of any tag.
pub fn filter_documents<'a>(docs: &'a [Document], filter: &LibraryFilter) -> Vec<&'a Document> {
    let term = filter.term.to_lowercase();
    let tag = filter.tag.to_lowercase();

    docs.iter()
        .filter(|d| {
            term.is_empty()
                || d.title.to_lowercase().contains(&term)
                || d.content.to_lowercase().contains(&term)
                || d
                    .summary
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&term))
        })
        .filter(|d| filter.category == ALL || d.category.as_deref() == Some(&filter.category))
        .filter(|d| tag.is_empty() || d.tags.iter().any(|t| t.to_lowercase().contains(&tag)))
        .collect()
}

/// Every distinct tag across `docs`, sorted.
pub fn all_tags(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .flat_map(|d| d.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
