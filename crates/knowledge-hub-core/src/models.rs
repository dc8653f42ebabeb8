//! Core data models used throughout Knowledge Hub.
//!
//! Persisted entities ([`Document`], [`ScrapedContent`], [`SearchQueryRecord`],
//! [`Report`]) are owned by the entity store. Each has a `New*` counterpart
//! carrying the caller-supplied fields; the store fills in `id` and
//! `created_date` on create.
//!
//! Search works over [`ContentItem`], a tagged union of the two content
//! kinds, and produces [`SearchResult`]s that are either stored content or
//! AI-synthesized [`SemanticResult`]s.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Sentinel used by filters to mean "do not filter on this field".
pub const ALL: &str = "all";

/// Discriminant for the two kinds of stored content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Document,
    Scraped,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Document => "document",
            SourceType::Scraped => "scraped",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    /// One of `pdf`, `py`, `md`, `rst`, `txt`.
    pub file_type: String,
    pub file_url: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub word_count: i64,
    pub processing_status: String,
    pub indexed_at: Option<DateTime<Utc>>,
    /// SHA-256 of `content`, used to skip duplicate uploads.
    pub content_hash: String,
    pub created_date: DateTime<Utc>,
}

/// Fields for [`EntityStore::create_document`](crate::store::EntityStore::create_document).
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub file_type: String,
    pub file_url: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub word_count: i64,
    pub processing_status: String,
    pub indexed_at: Option<DateTime<Utc>>,
    pub content_hash: String,
}

/// A web page captured by the scraper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedContent {
    pub id: String,
    pub source_url: String,
    pub title: String,
    pub content: String,
    pub content_type: Option<String>,
    pub domain: Option<String>,
    pub scrape_status: String,
    pub word_count: Option<i64>,
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub scraped_at: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
}

/// Fields for [`EntityStore::create_scraped`](crate::store::EntityStore::create_scraped).
#[derive(Debug, Clone)]
pub struct NewScrapedContent {
    pub source_url: String,
    pub title: String,
    pub content: String,
    pub content_type: Option<String>,
    pub domain: Option<String>,
    pub scrape_status: String,
    pub word_count: Option<i64>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub scraped_at: Option<DateTime<Utc>>,
}

/// A stored document or scraped page, tagged with its [`SourceType`].
///
/// Serializes with a `source_type` field alongside the record's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source_type", rename_all = "lowercase")]
pub enum ContentItem {
    Document(Document),
    Scraped(ScrapedContent),
}

impl ContentItem {
    pub fn source_type(&self) -> SourceType {
        match self {
            ContentItem::Document(_) => SourceType::Document,
            ContentItem::Scraped(_) => SourceType::Scraped,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ContentItem::Document(d) => &d.id,
            ContentItem::Scraped(s) => &s.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContentItem::Document(d) => &d.title,
            ContentItem::Scraped(s) => &s.title,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ContentItem::Document(d) => &d.content,
            ContentItem::Scraped(s) => &s.content,
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            ContentItem::Document(d) => d.summary.as_deref(),
            ContentItem::Scraped(s) => s.summary.as_deref(),
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            ContentItem::Document(d) => &d.tags,
            ContentItem::Scraped(s) => &s.tags,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            ContentItem::Document(d) => d.category.as_deref(),
            ContentItem::Scraped(s) => s.category.as_deref(),
        }
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        match self {
            ContentItem::Document(d) => d.created_date,
            ContentItem::Scraped(s) => s.created_date,
        }
    }

    pub fn source_url(&self) -> Option<&str> {
        match self {
            ContentItem::Document(_) => None,
            ContentItem::Scraped(s) => Some(&s.source_url),
        }
    }
}

/// A plausible match synthesized by the AI service for one search.
///
/// Never persisted. `source_type` is whatever the model returned, so it is
/// kept as a plain string rather than a [`SourceType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticResult {
    /// Synthetic id of the form `semantic-<index>`.
    pub id: String,
    pub title: String,
    pub content_excerpt: String,
    pub source_type: String,
    /// Model-assigned relevance in `0..=100`, if the model gave one.
    pub relevance_score: Option<f64>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
}

/// One entry of a search result list.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    Content(ContentItem),
    Semantic(SemanticResult),
}

impl SearchResult {
    pub fn is_semantic(&self) -> bool {
        matches!(self, SearchResult::Semantic(_))
    }

    pub fn id(&self) -> &str {
        match self {
            SearchResult::Content(c) => c.id(),
            SearchResult::Semantic(s) => &s.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            SearchResult::Content(c) => c.title(),
            SearchResult::Semantic(s) => &s.title,
        }
    }

    /// Body text for display: full content, or the excerpt for semantic results.
    pub fn content(&self) -> &str {
        match self {
            SearchResult::Content(c) => c.content(),
            SearchResult::Semantic(s) => &s.content_excerpt,
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            SearchResult::Content(c) => c.summary(),
            SearchResult::Semantic(s) => s.summary.as_deref(),
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            SearchResult::Content(c) => c.tags(),
            SearchResult::Semantic(s) => &s.tags,
        }
    }

    pub fn source_type(&self) -> &str {
        match self {
            SearchResult::Content(c) => c.source_type().as_str(),
            SearchResult::Semantic(s) => &s.source_type,
        }
    }

    /// Semantic results never carry a category.
    pub fn category(&self) -> Option<&str> {
        match self {
            SearchResult::Content(c) => c.category(),
            SearchResult::Semantic(_) => None,
        }
    }

    pub fn relevance_score(&self) -> Option<f64> {
        match self {
            SearchResult::Content(_) => None,
            SearchResult::Semantic(s) => s.relevance_score,
        }
    }

    /// Semantic results have no creation date.
    pub fn created_date(&self) -> Option<DateTime<Utc>> {
        match self {
            SearchResult::Content(c) => Some(c.created_date()),
            SearchResult::Semantic(_) => None,
        }
    }

    pub fn source_url(&self) -> Option<&str> {
        match self {
            SearchResult::Content(c) => c.source_url(),
            SearchResult::Semantic(_) => None,
        }
    }
}

impl Serialize for SearchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Flagged<'a, T: Serialize> {
            is_semantic: bool,
            #[serde(flatten)]
            inner: &'a T,
        }

        match self {
            SearchResult::Content(c) => Flagged {
                is_semantic: false,
                inner: c,
            }
            .serialize(serializer),
            SearchResult::Semantic(s) => Flagged {
                is_semantic: true,
                inner: s,
            }
            .serialize(serializer),
        }
    }
}

/// Search mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Substring match over stored content.
    Keyword,
    /// AI-synthesized results only.
    Semantic,
    /// Keyword matches followed by AI-synthesized results.
    Hybrid,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Keyword => "keyword",
            SearchType::Semantic => "semantic",
            SearchType::Hybrid => "hybrid",
        }
    }

    pub fn includes_keyword(&self) -> bool {
        matches!(self, SearchType::Keyword | SearchType::Hybrid)
    }

    pub fn includes_semantic(&self) -> bool {
        matches!(self, SearchType::Semantic | SearchType::Hybrid)
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keyword" => Ok(SearchType::Keyword),
            "semantic" => Ok(SearchType::Semantic),
            "hybrid" => Ok(SearchType::Hybrid),
            other => Err(format!(
                "Unknown search mode: {}. Use keyword, semantic, or hybrid.",
                other
            )),
        }
    }
}

/// Post-merge filters applied to a search result list.
///
/// `kind` and `category` use [`ALL`] to disable filtering. `date_range` is
/// accepted and echoed but does not filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// `all`, `document`, or `scraped`.
    #[serde(rename = "type", default = "all")]
    pub kind: String,
    #[serde(default = "all")]
    pub category: String,
    #[serde(rename = "dateRange", default = "all")]
    pub date_range: String,
}

fn all() -> String {
    ALL.to_string()
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            kind: all(),
            category: all(),
            date_range: all(),
        }
    }
}

/// Audit record persisted once per completed search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQueryRecord {
    pub id: String,
    pub query_text: String,
    pub search_type: SearchType,
    pub results_count: i64,
    /// Elapsed milliseconds.
    pub execution_time: i64,
    pub created_date: DateTime<Utc>,
}

/// Fields for [`EntityStore::create_search_query`](crate::store::EntityStore::create_search_query).
#[derive(Debug, Clone)]
pub struct NewSearchQuery {
    pub query_text: String,
    pub search_type: SearchType,
    pub results_count: i64,
    pub execution_time: i64,
}

/// Inclusive calendar date range a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// The `days` days ending at `now`.
    pub fn last_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start_date: (now - Duration::days(days)).date_naive(),
            end_date: now.date_naive(),
        }
    }
}

/// A generated report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub report_type: String,
    pub title: String,
    /// Report body exactly as returned by the AI service.
    pub data: serde_json::Value,
    pub generation_status: String,
    pub date_range: DateRange,
    pub generated_by: String,
    pub created_date: DateTime<Utc>,
}

/// Fields for [`EntityStore::create_report`](crate::store::EntityStore::create_report).
#[derive(Debug, Clone)]
pub struct NewReport {
    pub report_type: String,
    pub title: String,
    pub data: serde_json::Value,
    pub generation_status: String,
    pub date_range: DateRange,
    pub generated_by: String,
}
