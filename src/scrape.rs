//! `kh scrape`: queue URLs and store AI-described pages.

use anyhow::Result;

use knowledge_hub_core::scrape::{scrape_all, QueueStatus, ScrapeOutcome, UrlQueue};

use crate::config::Config;
use crate::db;
use crate::llm;
use crate::sqlite_store::SqliteStore;

/// CLI entry point for `kh scrape`.
pub async fn run_scrape(config: &Config, urls: &[String]) -> Result<()> {
    let mut queue = UrlQueue::new();
    for url in urls {
        if !queue.add(url) {
            println!("  ignoring blank or duplicate URL: {:?}", url);
        }
    }
    if queue.is_empty() {
        println!("No URLs to scrape.");
        return Ok(());
    }

    let ai = llm::create_service(&config.llm)?;
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let (outcomes, entries) = scrape_all(&store, ai.as_ref(), &queue).await;
    pool.close().await;

    for outcome in &outcomes {
        match outcome {
            ScrapeOutcome::Success { url, content } => {
                println!(
                    "  ok    {} -> \"{}\" ({})",
                    url,
                    content.title,
                    content.content_type.as_deref().unwrap_or("page")
                );
            }
            ScrapeOutcome::Error { url, error } => println!("  error {}: {}", url, error),
        }
    }

    let completed = entries
        .iter()
        .filter(|e| e.status == QueueStatus::Completed)
        .count();
    println!();
    println!("scrape complete");
    println!("  urls: {}", entries.len());
    println!("  completed: {}", completed);
    println!("  failed: {}", entries.len() - completed);

    Ok(())
}
