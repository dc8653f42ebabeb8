//! Entity storage abstraction for Knowledge Hub.
//!
//! The [`EntityStore`] trait is the generic list/create contract over the
//! four record kinds (documents, scraped pages, search queries, reports).
//! The workflow modules reach storage only through this trait, so the
//! SQLite store and the in-memory store are interchangeable.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::str::FromStr;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::models::{
    Document, NewDocument, NewReport, NewScrapedContent, NewSearchQuery, Report, ScrapedContent,
    SearchQueryRecord,
};

/// Ordering for a list call. Only `created_date` is sortable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub descending: bool,
}

impl SortSpec {
    pub const NEWEST_FIRST: SortSpec = SortSpec { descending: true };
    pub const OLDEST_FIRST: SortSpec = SortSpec { descending: false };
}

impl FromStr for SortSpec {
    type Err = anyhow::Error;

    /// Parses `"created_date"` or `"-created_date"` (descending).
    fn from_str(s: &str) -> Result<Self> {
        let (descending, field) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if field != "created_date" {
            bail!("unsupported sort field: {}", field);
        }
        Ok(SortSpec { descending })
    }
}

/// Options for a list call.
///
/// The default returns the full, unpaginated collection in store order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub sort: Option<SortSpec>,
    pub limit: Option<usize>,
}

impl ListOptions {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn newest_first() -> Self {
        Self {
            sort: Some(SortSpec::NEWEST_FIRST),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Abstract entity store for Knowledge Hub.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_documents`](EntityStore::list_documents) | List uploaded documents |
/// | [`list_scraped`](EntityStore::list_scraped) | List scraped pages |
/// | [`list_search_queries`](EntityStore::list_search_queries) | List search audit records |
/// | [`list_reports`](EntityStore::list_reports) | List generated reports |
/// | [`find_document_by_hash`](EntityStore::find_document_by_hash) | Duplicate check for uploads |
/// | `create_*` | Persist a record, assigning `id` and `created_date` |
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn list_documents(&self, opts: ListOptions) -> Result<Vec<Document>>;

    async fn list_scraped(&self, opts: ListOptions) -> Result<Vec<ScrapedContent>>;

    async fn list_search_queries(&self, opts: ListOptions) -> Result<Vec<SearchQueryRecord>>;

    async fn list_reports(&self, opts: ListOptions) -> Result<Vec<Report>>;

    /// Find a document whose content hashes to `content_hash`.
    async fn find_document_by_hash(&self, content_hash: &str) -> Result<Option<Document>>;

    async fn create_document(&self, new: NewDocument) -> Result<Document>;

    async fn create_scraped(&self, new: NewScrapedContent) -> Result<ScrapedContent>;

    async fn create_search_query(&self, new: NewSearchQuery) -> Result<SearchQueryRecord>;

    async fn create_report(&self, new: NewReport) -> Result<Report>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_spec_parse() {
        assert_eq!(
            "-created_date".parse::<SortSpec>().unwrap(),
            SortSpec::NEWEST_FIRST
        );
        assert_eq!(
            "created_date".parse::<SortSpec>().unwrap(),
            SortSpec::OLDEST_FIRST
        );
        assert!("-title".parse::<SortSpec>().is_err());
    }
}
