//! Data layer for Poker Ledger.
//!
//! Aggregates per-player statistics, parses free-text quick entries, derives
//! the dashboard and chart views, and persists sessions through the local
//! file and cloud table stores.

pub mod aggregator;
pub mod analytics;
pub mod quick_entry;
pub mod store;

pub use ledger_core as core;
