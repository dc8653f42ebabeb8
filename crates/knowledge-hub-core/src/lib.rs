//! # Knowledge Hub Core
//!
//! Storage-agnostic logic for Knowledge Hub: data models, the entity store
//! abstraction, the AI service trait, and the search, upload, scraping,
//! analytics, and reporting workflows built on top of them.
//!
//! This crate does no database, network, or filesystem I/O itself. The
//! application crate supplies an [`store::EntityStore`] (SQLite) and an
//! [`ai::AiService`] (an OpenAI-compatible HTTP client).

pub mod ai;
pub mod analytics;
pub mod history;
pub mod library;
pub mod models;
pub mod report;
pub mod scrape;
pub mod search;
pub mod store;
pub mod upload;

#[cfg(test)]
mod testing;
