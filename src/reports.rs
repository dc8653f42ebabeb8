//! `kh report`: generate, list, and export AI-written reports.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};

use knowledge_hub_core::analytics::{self, RECENT_WINDOW_DAYS};
use knowledge_hub_core::report::{self, DateRange, ReportType};

use crate::config::Config;
use crate::db;
use crate::llm;
use crate::sqlite_store::SqliteStore;

/// Build the report date range. Missing bounds default to the last 30 days.
pub fn date_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange> {
    let default = DateRange::last_days(Utc::now(), RECENT_WINDOW_DAYS);
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
    };
    let range = DateRange {
        start_date: start.map(parse).transpose()?.unwrap_or(default.start_date),
        end_date: end.map(parse).transpose()?.unwrap_or(default.end_date),
    };
    if range.start_date > range.end_date {
        bail!(
            "Start date {} is after end date {}",
            range.start_date,
            range.end_date
        );
    }
    Ok(range)
}

/// CLI entry point for `kh report generate`.
pub async fn run_generate(
    config: &Config,
    kind: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let kind: ReportType = kind.parse().map_err(anyhow::Error::msg)?;
    let range = date_range(start, end)?;
    let ai = llm::create_service(&config.llm)?;
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let stats = analytics::load(&store).await?;
    let created = report::generate(&store, ai.as_ref(), kind, &stats, range).await?;
    pool.close().await;

    println!("Generated {} ({})", created.title, created.id);
    println!(
        "  range: {} to {}",
        created.date_range.start_date, created.date_range.end_date
    );
    if let Some(summary) = created.data["executive_summary"].as_str() {
        println!();
        println!("{}", summary);
    }
    Ok(())
}

/// CLI entry point for `kh report list`.
pub async fn run_list(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let reports = report::list(&store).await?;
    pool.close().await;

    if reports.is_empty() {
        println!("No reports yet. Available types:");
        for kind in ReportType::ALL {
            println!("  {:<18} {}", kind.as_str(), kind.description());
        }
        return Ok(());
    }

    println!(
        "  {:<36} {:<30} {:<23}   {}",
        "ID", "TITLE", "RANGE", "CREATED"
    );
    println!("  {}", "-".repeat(110));
    for r in &reports {
        println!(
            "  {:<36} {:<30} {} to {}   {}",
            r.id,
            r.title,
            r.date_range.start_date,
            r.date_range.end_date,
            r.created_date.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// CLI entry point for `kh report export`: write one report as Markdown.
pub async fn run_export(config: &Config, id: &str, out: Option<&Path>) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let reports = report::list(&store).await?;
    pool.close().await;

    let Some(found) = reports.iter().find(|r| r.id == id) else {
        bail!("Report not found: {}", id);
    };
    let markdown = report::to_markdown(found);

    match out {
        Some(path) => {
            std::fs::write(path, &markdown)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", markdown),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_explicit() {
        let range = date_range(Some("2024-03-01"), Some("2024-03-31")).unwrap();
        assert_eq!(range.start_date.to_string(), "2024-03-01");
        assert_eq!(range.end_date.to_string(), "2024-03-31");
    }

    #[test]
    fn test_date_range_defaults_to_last_30_days() {
        let range = date_range(None, None).unwrap();
        assert_eq!((range.end_date - range.start_date).num_days(), 30);
    }

    #[test]
    fn test_date_range_rejects_inverted_and_bad_dates() {
        assert!(date_range(Some("2024-03-31"), Some("2024-03-01")).is_err());
        assert!(date_range(Some("March"), None).is_err());
    }
}
