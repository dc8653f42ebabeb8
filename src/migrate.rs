use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// `kh init`: create the database and every table. Safe to re-run.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create all tables and indexes on an open pool.
///
/// Timestamps are Unix milliseconds; tag lists are JSON arrays.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            file_type TEXT NOT NULL,
            file_url TEXT,
            summary TEXT,
            tags_json TEXT NOT NULL DEFAULT '[]',
            category TEXT,
            word_count INTEGER NOT NULL DEFAULT 0,
            processing_status TEXT NOT NULL,
            indexed_at INTEGER,
            content_hash TEXT NOT NULL,
            created_date INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scraped_content (
            id TEXT PRIMARY KEY,
            source_url TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            content_type TEXT,
            domain TEXT,
            scrape_status TEXT NOT NULL,
            word_count INTEGER,
            summary TEXT,
            tags_json TEXT NOT NULL DEFAULT '[]',
            category TEXT,
            scraped_at INTEGER,
            created_date INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS search_queries (
            id TEXT PRIMARY KEY,
            query_text TEXT NOT NULL,
            search_type TEXT NOT NULL,
            results_count INTEGER NOT NULL,
            execution_time INTEGER NOT NULL,
            created_date INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            id TEXT PRIMARY KEY,
            report_type TEXT NOT NULL,
            title TEXT NOT NULL,
            data_json TEXT NOT NULL,
            generation_status TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            generated_by TEXT NOT NULL,
            created_date INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_hash ON documents(content_hash)")
        .execute(pool)
        .await?;
    for table in ["documents", "scraped_content", "search_queries", "reports"] {
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_created ON {table}(created_date DESC)"
        ))
        .execute(pool)
        .await?;
    }

    Ok(())
}
