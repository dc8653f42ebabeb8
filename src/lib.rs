//! # Knowledge Hub
//!
//! A local technical knowledge base: upload documents, scrape web pages,
//! search everything with keyword, semantic (AI-synthesized), or hybrid
//! retrieval, and generate AI-written usage reports.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────┐   ┌──────────┐
//! │ Upload /    │──▶│ knowledge-hub-   │──▶│  SQLite  │
//! │ Scrape      │   │ core workflows   │   │          │
//! └─────────────┘   └────────┬─────────┘   └──────────┘
//!                            │ AiService
//!                            ▼
//!                      ┌──────────┐
//!                      │  OpenAI  │
//!                      └──────────┘
//!            ┌──────────┐       ┌──────────┐
//!            │   CLI    │       │   HTTP   │
//!            │   (kh)   │       │  (axum)  │
//!            └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! kh init                          # create database
//! kh upload ./docs                 # index local files
//! kh scrape https://docs.rs/tokio  # add a web page
//! kh search "async runtime" --mode hybrid
//! kh serve                         # start HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite `EntityStore` |
//! | [`llm`] | OpenAI-compatible `AiService` |
//! | [`extract`] | PDF and text extraction |
//! | [`search`] | Search and history commands |
//! | [`upload`] | File upload command |
//! | [`scrape`] | Web scraping command |
//! | [`browse`] | Knowledge-base browsing |
//! | [`stats`] | Dashboard counts and analytics |
//! | [`reports`] | Report generation and export |
//! | [`server`] | HTTP API |

pub mod browse;
pub mod config;
pub mod db;
pub mod extract;
pub mod llm;
pub mod migrate;
pub mod reports;
pub mod scrape;
pub mod search;
pub mod server;
pub mod sqlite_store;
pub mod stats;
pub mod upload;
