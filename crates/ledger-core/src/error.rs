use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the poker ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A timestamp or date string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A period name is not one of the recognised time windows.
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    /// A custom date range whose start falls after its end.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidDateRange { start: String, end: String },

    /// A rank ladder that is empty, unsorted or lacks a catch-all tier.
    #[error("Invalid rank ladder: {0}")]
    InvalidLadder(String),

    /// A session draft with no named players.
    #[error("A session needs at least one player")]
    EmptySession,

    /// Quick-entry text from which no player line could be recognised.
    #[error("No player entries recognised in quick-entry text")]
    EmptyQuickEntry,

    /// No session with the given id exists in the active store.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The storage backend failed (network, HTTP status or remote error).
    #[error("Storage error: {0}")]
    Storage(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the ledger crates.
pub type Result<T> = std::result::Result<T, LedgerError>;
