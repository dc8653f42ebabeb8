//! SQLite-backed [`EntityStore`] implementation.
//!
//! Each record kind has its own table (see [`crate::migrate`]). Timestamps
//! are stored as Unix milliseconds and tag lists as JSON text. Rows with the
//! same `created_date` keep insertion order via `rowid`.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use knowledge_hub_core::models::{
    DateRange, Document, NewDocument, NewReport, NewScrapedContent, NewSearchQuery, Report,
    ScrapedContent, SearchQueryRecord,
};
use knowledge_hub_core::store::{EntityStore, ListOptions};

/// SQLite implementation of the [`EntityStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn list_rows(&self, table: &str, opts: ListOptions) -> Result<Vec<SqliteRow>> {
        let order = match opts.sort {
            Some(s) if s.descending => "ORDER BY created_date DESC, rowid DESC",
            Some(_) => "ORDER BY created_date ASC, rowid ASC",
            None => "ORDER BY rowid ASC",
        };
        // SQLite treats a negative LIMIT as unbounded.
        let limit = opts.limit.map(|l| l as i64).unwrap_or(-1);
        let sql = format!("SELECT * FROM {table} {order} LIMIT ?");
        sqlx::query(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to list {table}"))
    }
}

/// Current time truncated to the stored millisecond precision.
fn now_millis() -> (DateTime<Utc>, i64) {
    let ms = Utc::now().timestamp_millis();
    (from_millis(ms).unwrap_or_else(Utc::now), ms)
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

fn ts(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let ms: i64 = row.get(column);
    from_millis(ms).ok_or_else(|| anyhow!("invalid timestamp in {}: {}", column, ms))
}

fn opt_ts(row: &SqliteRow, column: &str) -> Result<Option<DateTime<Utc>>> {
    let ms: Option<i64> = row.get(column);
    ms.map(|ms| from_millis(ms).ok_or_else(|| anyhow!("invalid timestamp in {}: {}", column, ms)))
        .transpose()
}

fn tags(row: &SqliteRow) -> Result<Vec<String>> {
    let json: String = row.get("tags_json");
    serde_json::from_str(&json).context("invalid tags_json")
}

fn date(row: &SqliteRow, column: &str) -> Result<NaiveDate> {
    let s: String = row.get(column);
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| format!("invalid {}: {}", column, s))
}

fn document_from_row(row: &SqliteRow) -> Result<Document> {
    Ok(Document {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        file_type: row.get("file_type"),
        file_url: row.get("file_url"),
        summary: row.get("summary"),
        tags: tags(row)?,
        category: row.get("category"),
        word_count: row.get("word_count"),
        processing_status: row.get("processing_status"),
        indexed_at: opt_ts(row, "indexed_at")?,
        content_hash: row.get("content_hash"),
        created_date: ts(row, "created_date")?,
    })
}

fn scraped_from_row(row: &SqliteRow) -> Result<ScrapedContent> {
    Ok(ScrapedContent {
        id: row.get("id"),
        source_url: row.get("source_url"),
        title: row.get("title"),
        content: row.get("content"),
        content_type: row.get("content_type"),
        domain: row.get("domain"),
        scrape_status: row.get("scrape_status"),
        word_count: row.get("word_count"),
        summary: row.get("summary"),
        tags: tags(row)?,
        category: row.get("category"),
        scraped_at: opt_ts(row, "scraped_at")?,
        created_date: ts(row, "created_date")?,
    })
}

fn search_query_from_row(row: &SqliteRow) -> Result<SearchQueryRecord> {
    let search_type: String = row.get("search_type");
    Ok(SearchQueryRecord {
        id: row.get("id"),
        query_text: row.get("query_text"),
        search_type: search_type.parse().map_err(|e: String| anyhow!(e))?,
        results_count: row.get("results_count"),
        execution_time: row.get("execution_time"),
        created_date: ts(row, "created_date")?,
    })
}

fn report_from_row(row: &SqliteRow) -> Result<Report> {
    let data_json: String = row.get("data_json");
    Ok(Report {
        id: row.get("id"),
        report_type: row.get("report_type"),
        title: row.get("title"),
        data: serde_json::from_str(&data_json).context("invalid report data_json")?,
        generation_status: row.get("generation_status"),
        date_range: DateRange {
            start_date: date(row, "start_date")?,
            end_date: date(row, "end_date")?,
        },
        generated_by: row.get("generated_by"),
        created_date: ts(row, "created_date")?,
    })
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn list_documents(&self, opts: ListOptions) -> Result<Vec<Document>> {
        self.list_rows("documents", opts)
            .await?
            .iter()
            .map(document_from_row)
            .collect()
    }

    async fn list_scraped(&self, opts: ListOptions) -> Result<Vec<ScrapedContent>> {
        self.list_rows("scraped_content", opts)
            .await?
            .iter()
            .map(scraped_from_row)
            .collect()
    }

    async fn list_search_queries(&self, opts: ListOptions) -> Result<Vec<SearchQueryRecord>> {
        self.list_rows("search_queries", opts)
            .await?
            .iter()
            .map(search_query_from_row)
            .collect()
    }

    async fn list_reports(&self, opts: ListOptions) -> Result<Vec<Report>> {
        self.list_rows("reports", opts)
            .await?
            .iter()
            .map(report_from_row)
            .collect()
    }

    async fn find_document_by_hash(&self, content_hash: &str) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT * FROM documents WHERE content_hash = ? LIMIT 1")
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(document_from_row).transpose()
    }

    async fn create_document(&self, new: NewDocument) -> Result<Document> {
        let id = Uuid::new_v4().to_string();
        let (created_date, created_ms) = now_millis();
        let indexed_ms = new.indexed_at.map(|t| t.timestamp_millis());

        sqlx::query(
            r#"
            INSERT INTO documents (id, title, content, file_type, file_url, summary, tags_json,
                                   category, word_count, processing_status, indexed_at,
                                   content_hash, created_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.title)
        .bind(&new.content)
        .bind(&new.file_type)
        .bind(&new.file_url)
        .bind(&new.summary)
        .bind(serde_json::to_string(&new.tags)?)
        .bind(&new.category)
        .bind(new.word_count)
        .bind(&new.processing_status)
        .bind(indexed_ms)
        .bind(&new.content_hash)
        .bind(created_ms)
        .execute(&self.pool)
        .await
        .context("Failed to insert document")?;

        Ok(Document {
            id,
            title: new.title,
            content: new.content,
            file_type: new.file_type,
            file_url: new.file_url,
            summary: new.summary,
            tags: new.tags,
            category: new.category,
            word_count: new.word_count,
            processing_status: new.processing_status,
            indexed_at: indexed_ms.and_then(from_millis),
            content_hash: new.content_hash,
            created_date,
        })
    }

    async fn create_scraped(&self, new: NewScrapedContent) -> Result<ScrapedContent> {
        let id = Uuid::new_v4().to_string();
        let (created_date, created_ms) = now_millis();
        let scraped_ms = new.scraped_at.map(|t| t.timestamp_millis());

        sqlx::query(
            r#"
            INSERT INTO scraped_content (id, source_url, title, content, content_type, domain,
                                         scrape_status, word_count, summary, tags_json,
                                         category, scraped_at, created_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.source_url)
        .bind(&new.title)
        .bind(&new.content)
        .bind(&new.content_type)
        .bind(&new.domain)
        .bind(&new.scrape_status)
        .bind(new.word_count)
        .bind(&new.summary)
        .bind(serde_json::to_string(&new.tags)?)
        .bind(&new.category)
        .bind(scraped_ms)
        .bind(created_ms)
        .execute(&self.pool)
        .await
        .context("Failed to insert scraped content")?;

        Ok(ScrapedContent {
            id,
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
            scraped_at: scraped_ms.and_then(from_millis),
            created_date,
        })
    }

    async fn create_search_query(&self, new: NewSearchQuery) -> Result<SearchQueryRecord> {
        let id = Uuid::new_v4().to_string();
        let (created_date, created_ms) = now_millis();

        sqlx::query(
            r#"
            INSERT INTO search_queries (id, query_text, search_type, results_count,
                                        execution_time, created_date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.query_text)
        .bind(new.search_type.as_str())
        .bind(new.results_count)
        .bind(new.execution_time)
        .bind(created_ms)
        .execute(&self.pool)
        .await
        .context("Failed to insert search query")?;

        Ok(SearchQueryRecord {
            id,
            query_text: new.query_text,
            search_type: new.search_type,
            results_count: new.results_count,
            execution_time: new.execution_time,
            created_date,
        })
    }

    async fn create_report(&self, new: NewReport) -> Result<Report> {
        let id = Uuid::new_v4().to_string();
        let (created_date, created_ms) = now_millis();

        sqlx::query(
            r#"
            INSERT INTO reports (id, report_type, title, data_json, generation_status,
                                 start_date, end_date, generated_by, created_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&new.report_type)
        .bind(&new.title)
        .bind(serde_json::to_string(&new.data)?)
        .bind(&new.generation_status)
        .bind(new.date_range.start_date.format("%Y-%m-%d").to_string())
        .bind(new.date_range.end_date.format("%Y-%m-%d").to_string())
        .bind(&new.generated_by)
        .bind(created_ms)
        .execute(&self.pool)
        .await
        .context("Failed to insert report")?;

        Ok(Report {
            id,
            report_type: new.report_type,
            title: new.title,
            data: new.data,
            generation_status: new.generation_status,
            date_range: new.date_range,
            generated_by: new.generated_by,
            created_date,
        })
    }
}
