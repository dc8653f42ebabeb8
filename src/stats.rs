//! Dashboard counts and usage analytics.
//!
//! `kh stats` prints the four collection counts plus database size;
//! `kh analytics` prints the 30-day activity summary used for reports.

use anyhow::Result;

use knowledge_hub_core::analytics::{self, Analytics, DashboardStats, RECENT_WINDOW_DAYS};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Run the stats command: count every collection and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let stats: DashboardStats = analytics::dashboard_stats(&store).await?;
    pool.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Knowledge Hub: Database Stats");
    println!("=============================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Documents:   {}", stats.documents);
    println!("  Searches:    {}", stats.searches);
    println!("  Scraped:     {}", stats.scraped);
    println!("  Reports:     {}", stats.reports);
    println!();

    Ok(())
}

/// Run the analytics command.
pub async fn run_analytics(config: &Config, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let a = analytics::load(&store).await?;
    pool.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&a)?);
    } else {
        print_analytics(&a);
    }
    Ok(())
}

fn print_analytics(a: &Analytics) {
    println!("Knowledge Hub: Analytics");
    println!("========================");
    println!();
    println!("  Documents:        {}", a.total_documents);
    println!("  Searches:         {}", a.total_searches);
    println!("  Scraped pages:    {}", a.total_scraped);
    println!(
        "  Last {} days:     {} documents, {} searches",
        RECENT_WINDOW_DAYS, a.recent_documents, a.recent_searches
    );
    println!("  Avg search time:  {:.2} ms", a.avg_search_time);

    if !a.top_categories.is_empty() {
        println!();
        println!("  Top categories:");
        for (category, count) in &a.top_categories {
            println!("    {:<24} {:>6}", category, count);
        }
    }

    if !a.search_trends.is_empty() {
        println!();
        println!("  Search trends:");
        for (word, count) in &a.search_trends {
            println!("    {:<24} {:>6}", word, count);
        }
    }
    println!();
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
