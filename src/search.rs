//! Search command and recent-search history.
//!
//! The pipeline itself lives in `knowledge-hub-core::search` and runs
//! against the [`EntityStore`] and [`AiService`] traits. This wrapper
//! resolves the mode from config, opens the database, and formats output.

use anyhow::{bail, Result};

pub use knowledge_hub_core::search::{SearchError, SearchOutcome, SearchRequest};
use knowledge_hub_core::ai::AiService;
use knowledge_hub_core::history;
use knowledge_hub_core::models::{SearchFilters, SearchResult, SearchType};
use knowledge_hub_core::store::EntityStore;

use crate::config::Config;
use crate::db;
use crate::llm;
use crate::sqlite_store::SqliteStore;

/// Pick the search mode: the requested one or the configured default.
///
/// With `semantic_enabled = false`, semantic mode is rejected and hybrid
/// runs as keyword.
pub fn resolve_mode(config: &Config, requested: Option<&str>) -> Result<SearchType> {
    let mode = match requested {
        Some(m) => m.parse::<SearchType>().map_err(anyhow::Error::msg)?,
        None => config.default_search_type(),
    };

    if config.search.semantic_enabled {
        return Ok(mode);
    }
    match mode {
        SearchType::Semantic => {
            bail!("Semantic search is disabled. Set [search] semantic_enabled = true in config.")
        }
        SearchType::Hybrid => Ok(SearchType::Keyword),
        SearchType::Keyword => Ok(SearchType::Keyword),
    }
}

/// Run one search through the core pipeline.
///
/// Shared by `kh search` and `POST /search`.
pub async fn search_knowledge<S, A>(
    store: &S,
    ai: &A,
    query: &str,
    search_type: SearchType,
    filters: &SearchFilters,
) -> Result<Option<SearchOutcome>, SearchError>
where
    S: EntityStore + ?Sized,
    A: AiService + ?Sized,
{
    let req = SearchRequest {
        query,
        search_type,
        filters,
    };
    knowledge_hub_core::search::run(store, ai, &req).await
}

/// CLI entry point for `kh search`.
pub async fn run_search(
    config: &Config,
    query: &str,
    mode: Option<&str>,
    filters: SearchFilters,
    json: bool,
) -> Result<()> {
    let search_type = resolve_mode(config, mode)?;
    let ai = llm::create_service(&config.llm)?;
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let outcome = search_knowledge(&store, ai.as_ref(), query, search_type, &filters).await;
    pool.close().await;

    let Some(outcome) = outcome? else {
        println!("Empty query, nothing to search.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!(
        "{} result{} for \"{}\" ({} mode, {} ms)",
        outcome.results.len(),
        if outcome.results.len() == 1 { "" } else { "s" },
        query,
        search_type,
        outcome.execution_time_ms
    );
    println!();

    for (i, result) in outcome.results.iter().enumerate() {
        print_result(i + 1, result);
    }

    Ok(())
}

fn print_result(rank: usize, result: &SearchResult) {
    match result.relevance_score() {
        Some(score) => println!(
            "{}. [{} {:.2}] {}",
            rank,
            result.source_type(),
            score,
            result.title()
        ),
        None => println!("{}. [{}] {}", rank, result.source_type(), result.title()),
    }
    if let Some(date) = result.created_date() {
        println!("    created: {}", date.format("%Y-%m-%d %H:%M"));
    }
    if let Some(category) = result.category() {
        println!("    category: {}", category);
    }
    if let Some(url) = result.source_url() {
        println!("    url: {}", url);
    }
    if !result.tags().is_empty() {
        println!("    tags: {}", result.tags().join(", "));
    }
    let excerpt: String = result.content().chars().take(200).collect();
    println!("    excerpt: \"{}\"", excerpt.replace('\n', " ").trim());
    println!("    id: {}", result.id());
    println!();
}

/// CLI entry point for `kh history`.
pub async fn run_history(config: &Config, limit: Option<usize>) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let records =
        history::recent_searches(&store, limit.unwrap_or(config.search.history_limit)).await?;
    pool.close().await;

    if records.is_empty() {
        println!("No searches yet.");
        return Ok(());
    }

    println!(
        "  {:<32} {:<9} {:>7} {:>8}   {}",
        "QUERY", "MODE", "RESULTS", "TIME", "WHEN"
    );
    println!("  {}", "-".repeat(76));
    for r in &records {
        println!(
            "  {:<32} {:<9} {:>7} {:>6}ms   {}",
            truncate(&r.query_text, 32),
            r.search_type,
            r.results_count,
            r.execution_time,
            r.created_date.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
