//! `kh browse`: list documents in the knowledge base with optional filters.

use anyhow::{bail, Result};

use knowledge_hub_core::library::{all_tags, filter_documents, LibraryFilter, CATEGORIES};
use knowledge_hub_core::store::{EntityStore, ListOptions};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// CLI entry point for `kh browse`.
pub async fn run_browse(config: &Config, filter: LibraryFilter) -> Result<()> {
    if !CATEGORIES.contains(&filter.category.as_str()) {
        bail!(
            "Unknown category: {}. Use one of: {}",
            filter.category,
            CATEGORIES.join(", ")
        );
    }

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let docs = store.list_documents(ListOptions::newest_first()).await?;
    pool.close().await;

    let matches = filter_documents(&docs, &filter);
    println!("{} of {} documents", matches.len(), docs.len());
    println!();

    for doc in &matches {
        println!(
            "  {}  [{}] {}",
            doc.created_date.format("%Y-%m-%d"),
            doc.category.as_deref().unwrap_or("other"),
            doc.title
        );
        if let Some(summary) = &doc.summary {
            println!("      {}", summary);
        }
        if !doc.tags.is_empty() {
            println!("      tags: {}", doc.tags.join(", "));
        }
        println!("      id: {}", doc.id);
    }

    let tags = all_tags(&docs);
    if !tags.is_empty() {
        println!();
        println!("  All tags: {}", tags.join(", "));
    }

    Ok(())
}
