//! JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/search` | Keyword, semantic, or hybrid search |
//! | `GET`  | `/searches/recent` | Most recent searches (`?limit=`) |
//! | `GET`  | `/documents` | Browse documents (`?q=&category=&tag=`) |
//! | `GET`  | `/stats` | Record counts per collection |
//! | `GET`  | `/analytics` | 30-day usage analytics |
//! | `GET`  | `/reports` | Reports, newest first |
//! | `POST` | `/reports` | Generate a report |
//! | `POST` | `/scrape` | Scrape a list of URLs |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `ai_unavailable` (502), `internal` (500).
//!
//! Searches are serialized: a search does not start until the previous
//! one has written its history record.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use knowledge_hub_core::ai::{AiError, AiService};
use knowledge_hub_core::analytics::{self, Analytics, DashboardStats};
use knowledge_hub_core::history;
use knowledge_hub_core::library::{all_tags, filter_documents, LibraryFilter};
use knowledge_hub_core::models::{Document, Report, SearchFilters, SearchQueryRecord};
use knowledge_hub_core::report::{self, ReportType};
use knowledge_hub_core::scrape::{scrape_all, QueueEntry, ScrapeOutcome, UrlQueue};
use knowledge_hub_core::store::{EntityStore, ListOptions};

use crate::config::Config;
use crate::db;
use crate::llm;
use crate::reports::date_range;
use crate::search::{resolve_mode, search_knowledge, SearchError, SearchOutcome};
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn EntityStore>,
    ai: Arc<dyn AiService>,
    /// Held for the duration of each search.
    search_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn EntityStore>, ai: Arc<dyn AiService>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            ai,
            search_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Build the router with all routes and a permissive CORS layer.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/search", post(handle_search))
        .route("/searches/recent", get(handle_recent_searches))
        .route("/documents", get(handle_documents))
        .route("/stats", get(handle_stats))
        .route("/analytics", get(handle_analytics))
        .route("/reports", get(handle_list_reports).post(handle_generate_report))
        .route("/scrape", post(handle_scrape))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let ai: Arc<dyn AiService> = Arc::from(llm::create_service(&config.llm)?);
    let pool = db::connect(config).await?;
    let store: Arc<dyn EntityStore> = Arc::new(SqliteStore::new(pool));
    let bind_addr = config.server.bind.clone();

    let app = build_router(AppState::new(config.clone(), store, ai));

    info!(bind = %bind_addr, "starting HTTP server");
    println!("Knowledge Hub listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// Error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn ai_unavailable(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "ai_unavailable",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    let message = message.into();
    error!(%message, "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message,
    }
}

impl From<anyhow::Error> for AppError {
    /// AI failures anywhere in the chain map to 502, everything else to 500.
    fn from(err: anyhow::Error) -> Self {
        if err.chain().any(|e| e.is::<AiError>()) {
            ai_unavailable(format!("{:#}", err))
        } else {
            internal(format!("{:#}", err))
        }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Ai(e) => ai_unavailable(e.to_string()),
            other => internal(other.to_string()),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchBody {
    query: String,
    #[serde(default)]
    search_type: Option<String>,
    #[serde(default)]
    filters: SearchFilters,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(body): Json<SearchBody>,
) -> Result<Json<SearchOutcome>, AppError> {
    if body.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    let search_type = resolve_mode(&state.config, body.search_type.as_deref())
        .map_err(|e| bad_request(e.to_string()))?;

    let _guard = state.search_lock.lock().await;
    let outcome = search_knowledge(
        state.store.as_ref(),
        state.ai.as_ref(),
        &body.query,
        search_type,
        &body.filters,
    )
    .await?;

    outcome
        .map(Json)
        .ok_or_else(|| bad_request("query must not be empty"))
}

// ============ GET /searches/recent ============

#[derive(Deserialize)]
struct RecentParams {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct RecentResponse {
    searches: Vec<SearchQueryRecord>,
}

async fn handle_recent_searches(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Result<Json<RecentResponse>, AppError> {
    let limit = params.limit.unwrap_or(state.config.search.history_limit);
    if limit == 0 {
        return Err(bad_request("limit must be >= 1"));
    }
    let searches = history::recent_searches(state.store.as_ref(), limit).await?;
    Ok(Json(RecentResponse { searches }))
}

// ============ GET /documents ============

#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<Document>,
    tags: Vec<String>,
}

async fn handle_documents(
    State(state): State<AppState>,
    Query(filter): Query<LibraryFilter>,
) -> Result<Json<DocumentsResponse>, AppError> {
    let docs = state
        .store
        .list_documents(ListOptions::newest_first())
        .await?;
    let documents = filter_documents(&docs, &filter)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(DocumentsResponse {
        documents,
        tags: all_tags(&docs),
    }))
}

// ============ GET /stats, GET /analytics ============

async fn handle_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(analytics::dashboard_stats(state.store.as_ref()).await?))
}

async fn handle_analytics(State(state): State<AppState>) -> Result<Json<Analytics>, AppError> {
    Ok(Json(analytics::load(state.store.as_ref()).await?))
}

// ============ GET/POST /reports ============

#[derive(Serialize)]
struct ReportsResponse {
    reports: Vec<Report>,
}

async fn handle_list_reports(
    State(state): State<AppState>,
) -> Result<Json<ReportsResponse>, AppError> {
    let reports = report::list(state.store.as_ref()).await?;
    Ok(Json(ReportsResponse { reports }))
}

#[derive(Deserialize)]
struct GenerateReportBody {
    report_type: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

async fn handle_generate_report(
    State(state): State<AppState>,
    Json(body): Json<GenerateReportBody>,
) -> Result<Json<Report>, AppError> {
    let kind: ReportType = body.report_type.parse().map_err(bad_request)?;
    let range = date_range(body.start_date.as_deref(), body.end_date.as_deref())
        .map_err(|e| bad_request(format!("{:#}", e)))?;

    let stats = analytics::load(state.store.as_ref()).await?;
    let created =
        report::generate(state.store.as_ref(), state.ai.as_ref(), kind, &stats, range).await?;
    Ok(Json(created))
}

// ============ POST /scrape ============

#[derive(Deserialize)]
struct ScrapeBody {
    urls: Vec<String>,
}

#[derive(Serialize)]
struct ScrapeResponse {
    outcomes: Vec<ScrapeOutcome>,
    queue: Vec<QueueEntry>,
}

async fn handle_scrape(
    State(state): State<AppState>,
    Json(body): Json<ScrapeBody>,
) -> Result<Json<ScrapeResponse>, AppError> {
    let queue: UrlQueue = body.urls.iter().collect();
    if queue.is_empty() {
        return Err(bad_request("urls must contain at least one URL"));
    }
    let (outcomes, queue) = scrape_all(state.store.as_ref(), state.ai.as_ref(), &queue).await;
    Ok(Json(ScrapeResponse { outcomes, queue }))
}
