//! Oddsfeed - change-aware snapshots of scraped match odds.
//!
//! A poller scrapes the current list of matches on a fixed interval and hands
//! each batch to the reconciliation engine, which keeps one authoritative
//! snapshot with stable, content-derived match ids.
//!
//! # Modules
//!
//! - [`domain`] - Records, odds ladders, stable identity and change detection
//! - [`engine`] - Batch reconciliation, scraper health and the injected clock
//! - [`store`] - Shared snapshot, identity mapping, history and persistence
//! - [`source`] - HTML scraper and JSON feed behind the `MatchSource` trait
//! - [`app`] - Configuration, poller and service wiring
//! - [`api`] - Read-only HTTP API
//! - [`cli`] - Command-line entry points
//! - [`error`] - Error types for the crate

pub mod api;
pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod error;
pub mod source;
pub mod store;
