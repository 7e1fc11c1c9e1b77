//! # staywatch
//!
//! Nightly rental price tracking: renders listing booking pages in headless
//! Chrome and stores the quoted price, fee and total per date window.
//!
//! ## Architecture
//!
//! ```text
//! Planner → Orchestrator → Scheduler → PriceExtractor → Normalizer → Store
//!                                                            └──→ RunSummary
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Track two listings
//! staywatch rooms add 45592704 1234567
//!
//! # Quote three-night stays for the next 30 check-in dates, 7 pages at a time
//! staywatch scrape --start 2025-05-21 --days 30
//!
//! # Inspect results
//! staywatch prices --room 45592704
//! staywatch runs
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// the normalizer and the loaded configuration.
pub mod app;

/// Command-line interface using clap.
///
/// - `scrape` - Scrape rooms over a window of check-in dates
/// - `scrape-url` - Scrape explicit listing URLs
/// - `rooms add|remove|list` - Manage tracked rooms
/// - `prices` - List stored prices
/// - `runs` - Show recent run summaries
pub mod cli;

/// Configuration loaded from `~/.config/staywatch/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`ScrapeTask`](domain::ScrapeTask): one listing visit for one date window
/// - [`ScrapeOutcome`](domain::ScrapeOutcome): what a visit produced
/// - [`NormalizedRecord`](domain::NormalizedRecord): numeric, storable prices
/// - [`RunSummary`](domain::RunSummary): aggregated counts and errors of a run
pub mod domain;

/// Currency text parsing and total computation.
pub mod normalizer;

/// Listing URL generation from room ids and a date window.
pub mod planner;

/// Browser-driven extraction, scheduling and orchestration.
pub mod scraper;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
