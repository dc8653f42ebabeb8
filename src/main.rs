//! # Knowledge Hub CLI (`kh`)
//!
//! ## Usage
//!
//! ```bash
//! kh --config ./config/kh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kh init` | Create the SQLite database and tables |
//! | `kh search "<query>"` | Search documents and scraped pages |
//! | `kh history` | Show recent searches |
//! | `kh upload <paths>...` | Upload and index files or directories |
//! | `kh scrape <urls>...` | Scrape web pages |
//! | `kh browse` | List documents with filters |
//! | `kh stats` | Record counts per collection |
//! | `kh analytics` | 30-day usage analytics |
//! | `kh report generate <type>` | Generate an AI-written report |
//! | `kh report list` | List reports |
//! | `kh report export <id>` | Write a report as Markdown |
//! | `kh serve` | Start the HTTP API |
//!
//! Logs go to stderr and are controlled by `KH_LOG` (default `warn`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use knowledge_hub::{browse, config, migrate, reports, scrape, search, server, stats, upload};
use knowledge_hub_core::library::LibraryFilter;
use knowledge_hub_core::models::SearchFilters;

/// Knowledge Hub CLI: a local technical knowledge base with AI-assisted search.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "kh",
    about = "Knowledge Hub: upload, scrape, and search a technical knowledge base",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kh.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run more than once.
    Init,

    /// Search documents and scraped pages.
    Search {
        /// The search query string.
        query: String,

        /// `keyword`, `semantic`, or `hybrid`. Defaults to `[search] default_mode`.
        #[arg(long)]
        mode: Option<String>,

        /// Source filter: `all`, `document`, or `scraped`.
        #[arg(long = "type", default_value = "all")]
        kind: String,

        /// Category filter, or `all`.
        #[arg(long, default_value = "all")]
        category: String,

        /// Date range label. Recorded but not applied.
        #[arg(long, default_value = "all")]
        date_range: String,

        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the most recent searches.
    History {
        /// Number of searches to show. Defaults to `[search] history_limit`.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Upload files (pdf, txt, py, md, rst). Directories are walked recursively.
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Scrape web pages. Blank and duplicate URLs are ignored.
    Scrape {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// List documents, optionally filtered.
    Browse {
        /// Case-insensitive text in title, content, or summary.
        #[arg(long, default_value = "")]
        term: String,

        #[arg(long, default_value = "all")]
        category: String,

        /// Case-insensitive text in any tag.
        #[arg(long, default_value = "")]
        tag: String,
    },

    /// Show record counts per collection.
    Stats,

    /// Show 30-day usage analytics.
    Analytics {
        #[arg(long)]
        json: bool,
    },

    /// Generate and manage reports.
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },

    /// Start the HTTP API on `[server] bind`.
    Serve,
}

#[derive(Subcommand)]
enum ReportAction {
    /// Generate a report: usage_analytics, content_summary, search_insights, processing_stats.
    Generate {
        report_type: String,

        /// First day covered (YYYY-MM-DD). Defaults to 30 days ago.
        #[arg(long)]
        start: Option<String>,

        /// Last day covered (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,
    },

    /// List reports, newest first.
    List,

    /// Print a report as Markdown, or write it to `--out`.
    Export {
        id: String,

        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("KH_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Search {
            query,
            mode,
            kind,
            category,
            date_range,
            json,
        } => {
            let filters = SearchFilters {
                kind,
                category,
                date_range,
            };
            search::run_search(&cfg, &query, mode.as_deref(), filters, json).await?;
        }
        Commands::History { limit } => {
            search::run_history(&cfg, limit).await?;
        }
        Commands::Upload { paths } => {
            upload::run_upload(&cfg, &paths).await?;
        }
        Commands::Scrape { urls } => {
            scrape::run_scrape(&cfg, &urls).await?;
        }
        Commands::Browse {
            term,
            category,
            tag,
        } => {
            browse::run_browse(
                &cfg,
                LibraryFilter {
                    term,
                    category,
                    tag,
                },
            )
            .await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Analytics { json } => {
            stats::run_analytics(&cfg, json).await?;
        }
        Commands::Report { action } => match action {
            ReportAction::Generate {
                report_type,
                start,
                end,
            } => {
                reports::run_generate(&cfg, &report_type, start.as_deref(), end.as_deref())
                    .await?;
            }
            ReportAction::List => {
                reports::run_list(&cfg).await?;
            }
            ReportAction::Export { id, out } => {
                reports::run_export(&cfg, &id, out.as_deref()).await?;
            }
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
