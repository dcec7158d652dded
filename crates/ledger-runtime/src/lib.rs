//! Runtime layer for Poker Ledger.
//!
//! Owns the active session store and the current session collection, and
//! serves the derived views the binary renders.

pub mod ledger;

pub use ledger_core as core;
pub use ledger_data as data;
