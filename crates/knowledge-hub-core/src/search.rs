//! Search pipeline with keyword, semantic, and hybrid modes.
//!
//! The pipeline operates entirely through the [`EntityStore`] and
//! [`AiService`] traits. One call to [`run`] is a single pass:
//!
//! 1. **Keyword** (keyword/hybrid): list documents and scraped pages
//!    concurrently, keep items whose title, content, summary, or joined tags
//!    contain the lower-cased query.
//! 2. **Semantic** (semantic/hybrid): one AI call synthesizes 3 to 5 plausible
//!    results, appended after the keyword matches without deduplication.
//!    The call is made only after the keyword fetch succeeds, so a failed
//!    fetch never spends an AI request.
//! 3. **Filter** by source type, then by category (semantic results have no
//!    category, so any category filter drops them).
//! 4. **Sort** with [`compare`]: semantic first, then relevance score
//!    (desc) when both sides have one, then creation date (desc). A semantic
//!    result the model returned without a score falls through to the date
//!    tier.
//! 5. **Record** one [`SearchQueryRecord`] with the result count and
//!    elapsed milliseconds.
//!
//! A failed AI call degrades a hybrid search to keyword-only; a
//! semantic-only search fails instead of reporting zero results.

use std::cmp::Ordering;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::ai::{invoke_as, AiError, AiService};
use crate::models::{
    ContentItem, NewSearchQuery, SearchFilters, SearchQueryRecord, SearchResult, SearchType,
    SemanticResult, ALL,
};
use crate::store::{EntityStore, ListOptions};

/// Prefix for the synthetic ids given to semantic results.
pub const SEMANTIC_ID_PREFIX: &str = "semantic-";

/// Bundles all inputs for a single search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub search_type: SearchType,
    pub filters: &'a SearchFilters,
}

/// Output of a completed search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Filtered, ordered results.
    pub results: Vec<SearchResult>,
    /// Milliseconds from invocation start to the end of sorting.
    pub execution_time_ms: i64,
    /// The audit record written for this search.
    pub record: SearchQueryRecord,
}

/// Why a search did not complete.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Listing a content collection failed. Nothing was recorded.
    #[error("failed to fetch {collection}: {source}")]
    Fetch {
        collection: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The AI call failed during a semantic-only search.
    #[error("semantic search failed: {0}")]
    Ai(#[from] AiError),

    /// Writing the audit record failed.
    #[error("failed to record search: {0}")]
    Persist(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Run one search.
///
/// Returns `Ok(None)` without touching the store or the AI service when the
/// query is empty or whitespace-only.
pub async fn run<S, A>(
    store: &S,
    ai: &A,
    req: &SearchRequest<'_>,
) -> Result<Option<SearchOutcome>, SearchError>
where
    S: EntityStore + ?Sized,
    A: AiService + ?Sized,
{
    if req.query.trim().is_empty() {
        debug!("empty query, skipping search");
        return Ok(None);
    }

    let started = Instant::now();

    let snapshot = if req.search_type.includes_keyword() {
        Some(fetch_content(store).await?)
    } else {
        None
    };
    let semantic = if req.search_type.includes_semantic() {
        Some(semantic_results(ai, req.query).await)
    } else {
        None
    };

    let mut merged: Vec<SearchResult> = Vec::new();

    if let Some(items) = snapshot {
        let matches = keyword_matches(&items, req.query);
        debug!(
            candidates = items.len(),
            matches = matches.len(),
            "keyword stage"
        );
        merged.extend(matches.into_iter().map(SearchResult::Content));
    }

    match semantic {
        Some(Ok(results)) => {
            debug!(results = results.len(), "semantic stage");
            merged.extend(results.into_iter().map(SearchResult::Semantic));
        }
        Some(Err(e)) if req.search_type == SearchType::Hybrid => {
            warn!(error = %e, "semantic stage failed, returning keyword results only");
        }
        Some(Err(e)) => return Err(SearchError::Ai(e)),
        None => {}
    }

    let mut results = apply_filters(&merged, req.filters);
    sort_results(&mut results);

    let execution_time_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

    let record = store
        .create_search_query(NewSearchQuery {
            query_text: req.query.to_string(),
            search_type: req.search_type,
            results_count: results.len() as i64,
            execution_time: execution_time_ms,
        })
        .await
        .map_err(|e| SearchError::Persist(e.into()))?;

    Ok(Some(SearchOutcome {
        results,
        execution_time_ms,
        record,
    }))
}

/// List every document and scraped page concurrently, tagged by kind.
///
/// Fails as a whole if either list call fails.
pub async fn fetch_content<S>(store: &S) -> Result<Vec<ContentItem>, SearchError>
where
    S: EntityStore + ?Sized,
{
    let documents = async {
        store
            .list_documents(ListOptions::all())
            .await
            .map_err(|e| SearchError::Fetch {
                collection: "documents",
                source: e.into(),
            })
    };
    let scraped = async {
        store
            .list_scraped(ListOptions::all())
            .await
            .map_err(|e| SearchError::Fetch {
                collection: "scraped content",
                source: e.into(),
            })
    };
    let (documents, scraped) = futures::try_join!(documents, scraped)?;

    Ok(documents
        .into_iter()
        .map(ContentItem::Document)
        .chain(scraped.into_iter().map(ContentItem::Scraped))
        .collect())
}

/// True when `needle` (already lower-cased) occurs in the item's title,
/// content, summary, or space-joined tags, ignoring case.
pub fn matches_query(item: &ContentItem, needle: &str) -> bool {
    item.title().to_lowercase().contains(needle)
        || item.content().to_lowercase().contains(needle)
        || item
            .summary()
            .is_some_and(|s| s.to_lowercase().contains(needle))
        || item.tags().join(" ").to_lowercase().contains(needle)
}

/// Keep the items matching `query` by case-insensitive substring, in input order.
pub fn keyword_matches(items: &[ContentItem], query: &str) -> Vec<ContentItem> {
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|item| matches_query(item, &needle))
        .cloned()
        .collect()
}

/// Prompt for the semantic stage.
pub fn semantic_prompt(query: &str) -> String {
    format!(
        r#"Perform a semantic search for the query: "{query}"

Based on this query, generate 3-5 relevant search results that would match semantically. Each result should have:
- title: A relevant document/article title
- content_excerpt: A short excerpt (100-200 words)
- source_type: Either "document" or "scraped"
- relevance_score: A score from 0-100
- tags: Array of relevant tags
- summary: Brief summary explaining why this is relevant

Focus on programming tutorials, documentation, and technical concepts."#
    )
}

/// Response schema for the semantic stage.
pub fn semantic_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "content_excerpt": { "type": "string" },
                        "source_type": { "type": "string" },
                        "relevance_score": { "type": "number" },
                        "tags": { "type": "array", "items": { "type": "string" } },
                        "summary": { "type": "string" }
                    }
                }
            }
        }
    })
}

#[derive(Deserialize)]
struct SemanticResponse {
    results: Vec<RawSemanticResult>,
}

#[derive(Deserialize)]
struct RawSemanticResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content_excerpt: String,
    #[serde(default)]
    source_type: String,
    #[serde(default)]
    relevance_score: Option<f64>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
}

/// Ask the AI service for semantic results and assign synthetic ids.
pub async fn semantic_results<A>(ai: &A, query: &str) -> Result<Vec<SemanticResult>, AiError>
where
    A: AiService + ?Sized,
{
    let response: SemanticResponse =
        invoke_as(ai, &semantic_prompt(query), &semantic_schema()).await?;

    Ok(response
        .results
        .into_iter()
        .enumerate()
        .map(|(index, r)| SemanticResult {
            id: format!("{SEMANTIC_ID_PREFIX}{index}"),
            title: r.title,
            content_excerpt: r.content_excerpt,
            source_type: r.source_type,
            relevance_score: r.relevance_score,
            tags: r.tags,
            summary: r.summary,
        })
        .collect())
}

/// Apply the type filter, then the category filter. Returns a new list.
pub fn apply_filters(results: &[SearchResult], filters: &SearchFilters) -> Vec<SearchResult> {
    results
        .iter()
        .filter(|r| filters.kind == ALL || r.source_type() == filters.kind)
        .filter(|r| filters.category == ALL || r.category() == Some(filters.category.as_str()))
        .cloned()
        .collect()
}

/// Semantic results sort before stored content.
pub fn by_semantic_first(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.is_semantic().cmp(&a.is_semantic())
}

/// Higher relevance first, decided only when both sides carry a score.
pub fn by_relevance_score(a: &SearchResult, b: &SearchResult) -> Option<Ordering> {
    match (a.relevance_score(), b.relevance_score()) {
        (Some(sa), Some(sb)) => Some(sb.total_cmp(&sa)),
        _ => None,
    }
}

/// Newer first; a missing date counts as the epoch.
pub fn by_created_desc(a: &SearchResult, b: &SearchResult) -> Ordering {
    let millis = |r: &SearchResult| r.created_date().map_or(0, |d| d.timestamp_millis());
    millis(b).cmp(&millis(a))
}

/// The result ordering: [`by_semantic_first`], then [`by_relevance_score`]
/// when it applies, otherwise [`by_created_desc`].
pub fn compare(a: &SearchResult, b: &SearchResult) -> Ordering {
    by_semantic_first(a, b)
        .then_with(|| by_relevance_score(a, b).unwrap_or_else(|| by_created_desc(a, b)))
}

/// Stable sort by [`compare`].
pub fn sort_results(results: &mut [SearchResult]) {
    results.sort_by(compare);
}
