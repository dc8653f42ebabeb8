//! In-memory [`EntityStore`] implementation for testing.
//!
//! Each record kind lives in a `Vec` behind `std::sync::RwLock`, kept in
//! insertion order. Sorting and limits are applied on read.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Document, NewDocument, NewReport, NewScrapedContent, NewSearchQuery, Report, ScrapedContent,
    SearchQueryRecord,
};

use super::{EntityStore, ListOptions};

/// In-memory store for tests and embedded use.
pub struct InMemoryStore {
    documents: RwLock<Vec<Document>>,
    scraped: RwLock<Vec<ScrapedContent>>,
    searches: RwLock<Vec<SearchQueryRecord>>,
    reports: RwLock<Vec<Report>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(Vec::new()),
            scraped: RwLock::new(Vec::new()),
            searches: RwLock::new(Vec::new()),
            reports: RwLock::new(Vec::new()),
        }
    }

    /// Seed a fully-formed document, keeping its `id` and `created_date`.
    pub fn insert_document(&self, doc: Document) -> Result<()> {
        write(&self.documents)?.push(doc);
        Ok(())
    }

    /// Seed a fully-formed scraped page, keeping its `id` and `created_date`.
    pub fn insert_scraped(&self, page: ScrapedContent) -> Result<()> {
        write(&self.scraped)?.push(page);
        Ok(())
    }

    /// Seed a search record, keeping its `id` and `created_date`.
    pub fn insert_search_query(&self, record: SearchQueryRecord) -> Result<()> {
        write(&self.searches)?.push(record);
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<std::sync::RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn write<T>(lock: &RwLock<T>) -> Result<std::sync::RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
}

fn list_sorted<T: Clone>(
    items: &[T],
    opts: ListOptions,
    created: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut out = items.to_vec();
    if let Some(sort) = opts.sort {
        if sort.descending {
            // Reverse first so equal timestamps come back newest-inserted first.
            out.reverse();
            out.sort_by(|a, b| created(b).cmp(&created(a)));
        } else {
            out.sort_by_key(|item| created(item));
        }
    }
    if let Some(limit) = opts.limit {
        out.truncate(limit);
    }
    out
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn list_documents(&self, opts: ListOptions) -> Result<Vec<Document>> {
        Ok(list_sorted(&read(&self.documents)?, opts, |d| d.created_date))
    }

    async fn list_scraped(&self, opts: ListOptions) -> Result<Vec<ScrapedContent>> {
        Ok(list_sorted(&read(&self.scraped)?, opts, |s| s.created_date))
    }

    async fn list_search_queries(&self, opts: ListOptions) -> Result<Vec<SearchQueryRecord>> {
        Ok(list_sorted(&read(&self.searches)?, opts, |q| q.created_date))
    }

    async fn list_reports(&self, opts: ListOptions) -> Result<Vec<Report>> {
        Ok(list_sorted(&read(&self.reports)?, opts, |r| r.created_date))
    }

    async fn find_document_by_hash(&self, content_hash: &str) -> Result<Option<Document>> {
        Ok(read(&self.documents)?
            .iter()
            .find(|d| d.content_hash == content_hash)
            .cloned())
    }

    async fn create_document(&self, new: NewDocument) -> Result<Document> {
        let doc = Document {
            id: new_id(),
            title: new.title,
            content: new.content,
            file_type: new.file_type,
            file_url: new.file_url,
            summary: new.summary,
            tags: new.tags,
            category: new.category,
            word_count: new.word_count,
            processing_status: new.processing_status,
            indexed_at: new.indexed_at,
            content_hash: new.content_hash,
            created_date: Utc::now(),
        };
        write(&self.documents)?.push(doc.clone());
        Ok(doc)
    }

    async fn create_scraped(&self, new: NewScrapedContent) -> Result<ScrapedContent> {
        let page = ScrapedContent {
            id: new_id(),
            source_url: new.source_url,
            title: new.title,
            content: new.content,
            content_type: new.content_type,
            domain: new.domain,
            scrape_status: new.scrape_status,
            word_count: new.word_count,
            summary: new.summary,
            tags: new.tags,
            category: new.category,
            scraped_at: new.scraped_at,
            created_date: Utc::now(),
        };
        write(&self.scraped)?.push(page.clone());
        Ok(page)
    }

    async fn create_search_query(&self, new: NewSearchQuery) -> Result<SearchQueryRecord> {
        let record = SearchQueryRecord {
            id: new_id(),
            query_text: new.query_text,
            search_type: new.search_type,
            results_count: new.results_count,
            execution_time: new.execution_time,
            created_date: Utc::now(),
        };
        write(&self.searches)?.push(record.clone());
        Ok(record)
    }

    async fn create_report(&self, new: NewReport) -> Result<Report> {
        let report = Report {
            id: new_id(),
            report_type: new.report_type,
            title: new.title,
            data: new.data,
            generation_status: new.generation_status,
            date_range: new.date_range,
            generated_by: new.generated_by,
            created_date: Utc::now(),
        };
        write(&self.reports)?.push(report.clone());
        Ok(report)
    }
}
