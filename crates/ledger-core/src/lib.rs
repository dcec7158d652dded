//! Core domain types for Poker Ledger.
//!
//! Session and player models, the rank ladder, time-window periods,
//! timezone handling, display formatting and the CLI settings shared by the
//! data, runtime and binary crates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod periods;
pub mod ranks;
pub mod settings;
pub mod time_utils;

pub use error::{LedgerError, Result};
