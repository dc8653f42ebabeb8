//! Dashboard counts and usage analytics.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{Document, SearchQueryRecord};
use crate::store::{EntityStore, ListOptions};

/// Window for "recent" documents and searches.
pub const RECENT_WINDOW_DAYS: i64 = 30;
pub const TOP_CATEGORIES: usize = 5;
pub const TOP_TRENDS: usize = 10;

/// Label for documents with no category.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub documents: usize,
    pub searches: usize,
    pub scraped: usize,
    pub reports: usize,
}

/// Record counts for each collection, fetched concurrently.
pub async fn dashboard_stats<S: EntityStore + ?Sized>(store: &S) -> Result<DashboardStats> {
    let (documents, searches, scraped, reports) = futures::try_join!(
        store.list_documents(ListOptions::all()),
        store.list_search_queries(ListOptions::all()),
        store.list_scraped(ListOptions::all()),
        store.list_reports(ListOptions::all()),
    )?;
    Ok(DashboardStats {
        documents: documents.len(),
        searches: searches.len(),
        scraped: scraped.len(),
        reports: reports.len(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub total_documents: usize,
    pub total_searches: usize,
    pub total_scraped: usize,
    pub recent_documents: usize,
    pub recent_searches: usize,
    /// Mean search execution time in ms, 0 with no searches.
    pub avg_search_time: f64,
    pub top_categories: Vec<(String, usize)>,
    pub search_trends: Vec<(String, usize)>,
}

/// Compute analytics relative to `now`.
pub fn compute(
    documents: &[Document],
    searches: &[SearchQueryRecord],
    total_scraped: usize,
    now: DateTime<Utc>,
) -> Analytics {
    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let recent_documents = documents
        .iter()
        .filter(|d| d.created_date >= cutoff)
        .count();
    let recent_searches: Vec<&SearchQueryRecord> = searches
        .iter()
        .filter(|s| s.created_date >= cutoff)
        .collect();

    let avg_search_time = if searches.is_empty() {
        0.0
    } else {
        searches.iter().map(|s| s.execution_time as f64).sum::<f64>() / searches.len() as f64
    };

    Analytics {
        total_documents: documents.len(),
        total_searches: searches.len(),
        total_scraped,
        recent_documents,
        recent_searches: recent_searches.len(),
        avg_search_time,
        top_categories: top_categories(documents),
        search_trends: search_trends(recent_searches.iter().map(|s| s.query_text.as_str())),
    }
}

/// Fetch every collection and compute analytics as of now.
pub async fn load<S: EntityStore + ?Sized>(store: &S) -> Result<Analytics> {
    let (documents, searches, scraped) = futures::try_join!(
        store.list_documents(ListOptions::all()),
        store.list_search_queries(ListOptions::all()),
        store.list_scraped(ListOptions::all()),
    )?;
    Ok(compute(&documents, &searches, scraped.len(), Utc::now()))
}

/// The most common document categories, most frequent first.
pub fn top_categories(documents: &[Document]) -> Vec<(String, usize)> {
    ranked(
        documents
            .iter()
            .map(|d| d.category.as_deref().unwrap_or(UNCATEGORIZED)),
        TOP_CATEGORIES,
    )
}

/// The most frequent query words longer than three characters.
pub fn search_trends<'a>(queries: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
    let words: Vec<String> = queries
        .into_iter()
        .flat_map(|q| {
            q.to_lowercase()
                .split(' ')
                .filter(|w| w.chars().count() > 3)
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    ranked(words.iter().map(String::as_str), TOP_TRENDS)
}

/// Count occurrences and keep the `limit` largest. Ties keep first-seen order.
fn ranked<'a>(items: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for item in items {
        let count = counts.entry(item).or_insert(0);
        if *count == 0 {
            order.push(item);
        }
        *count += 1;
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|k| (k.to_string(), counts[k]))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}
