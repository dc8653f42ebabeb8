//! Fixtures and a scripted [`AiService`] shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use crate::ai::{AiError, AiService};
use crate::models::{
    Document, NewDocument, NewReport, NewScrapedContent, NewSearchQuery, Report, ScrapedContent,
    SearchQueryRecord,
};
use crate::store::memory::InMemoryStore;
use crate::store::{EntityStore, ListOptions};

/// A fixed point in time plus `day` days.
pub fn ts(day: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
        + Duration::days(day)
}

pub fn document(id: &str, title: &str, content: &str, day: i64) -> Document {
    Document {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        file_type: "md".to_string(),
        file_url: None,
        summary: None,
        tags: Vec::new(),
        category: None,
        word_count: content.split(' ').count() as i64,
        processing_status: "completed".to_string(),
        indexed_at: None,
        content_hash: format!("hash-{id}"),
        created_date: ts(day),
    }
}

pub fn scraped(id: &str, title: &str, content: &str, day: i64) -> ScrapedContent {
    ScrapedContent {
        id: id.to_string(),
        source_url: format!("https://example.com/{id}"),
        title: title.to_string(),
        content: content.to_string(),
        content_type: Some("article".to_string()),
        domain: Some("example.com".to_string()),
        scrape_status: "completed".to_string(),
        word_count: None,
        summary: None,
        tags: Vec::new(),
        category: None,
        scraped_at: None,
        created_date: ts(day),
    }
}

/// A semantic-search response with one result per `(title, source_type, score)`.
pub fn semantic_payload(results: &[(&str, &str, f64)]) -> Value {
    let results: Vec<Value> = results
        .iter()
        .map(|(title, source_type, score)| {
            json!({
                "title": title,
                "content_excerpt": format!("About {title}"),
                "source_type": source_type,
                "relevance_score": score,
                "tags": ["python"],
                "summary": "relevant"
            })
        })
        .collect();
    json!({ "results": results })
}

/// Replays queued responses in order and records every prompt.
pub struct ScriptedAi {
    responses: Mutex<VecDeque<Result<Value, AiError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAi {
    pub fn new(responses: Vec<Result<Value, AiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiService for ScriptedAi {
    async fn invoke(&self, prompt: &str, _schema: &Value) -> Result<Value, AiError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AiError::Provider("no scripted response left".into())))
    }
}

/// Wraps an [`InMemoryStore`], counting list calls and optionally failing
/// `list_scraped`.
pub struct CountingStore {
    inner: InMemoryStore,
    list_calls: AtomicUsize,
    fail_scraped: bool,
}

impl CountingStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            list_calls: AtomicUsize::new(0),
            fail_scraped: false,
        }
    }

    pub fn failing_scraped(inner: InMemoryStore) -> Self {
        Self {
            fail_scraped: true,
            ..Self::new(inner)
        }
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntityStore for CountingStore {
    async fn list_documents(&self, opts: ListOptions) -> Result<Vec<Document>> {
        self.count();
        self.inner.list_documents(opts).await
    }

    async fn list_scraped(&self, opts: ListOptions) -> Result<Vec<ScrapedContent>> {
        self.count();
        if self.fail_scraped {
            bail!("scraped_content table unavailable");
        }
        self.inner.list_scraped(opts).await
    }

    async fn list_search_queries(&self, opts: ListOptions) -> Result<Vec<SearchQueryRecord>> {
        self.count();
        self.inner.list_search_queries(opts).await
    }

    async fn list_reports(&self, opts: ListOptions) -> Result<Vec<Report>> {
        self.count();
        self.inner.list_reports(opts).await
    }

    async fn find_document_by_hash(&self, content_hash: &str) -> Result<Option<Document>> {
        self.inner.find_document_by_hash(content_hash).await
    }

    async fn create_document(&self, new: NewDocument) -> Result<Document> {
        self.inner.create_document(new).await
    }

    async fn create_scraped(&self, new: NewScrapedContent) -> Result<ScrapedContent> {
        self.inner.create_scraped(new).await
    }

    async fn create_search_query(&self, new: NewSearchQuery) -> Result<SearchQueryRecord> {
        self.inner.create_search_query(new).await
    }

    async fn create_report(&self, new: NewReport) -> Result<Report> {
        self.inner.create_report(new).await
    }
}
