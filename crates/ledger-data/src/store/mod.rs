//! Session persistence.
//!
//! Every mutation returns the refreshed collection so callers always hold
//! what the backend holds.

pub mod cloud;
pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use ledger_core::error::{LedgerError, Result};
use ledger_core::models::PokerSession;

pub use cloud::CloudStore;
pub use local::LocalStore;

/// A backend that holds the session collection.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Short backend name for log lines and status output.
    fn name(&self) -> &str;

    async fn load(&self) -> Result<Vec<PokerSession>>;

    /// Store a new session; it becomes the first element.
    async fn add(&self, session: &PokerSession) -> Result<Vec<PokerSession>>;

    /// Replace the session with the same id.
    async fn update(&self, session: &PokerSession) -> Result<Vec<PokerSession>>;

    async fn remove(&self, id: &str) -> Result<Vec<PokerSession>>;
}

/// Where sessions live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Local JSON file used when no cloud partition is configured.
    pub data_file: PathBuf,
    pub sync_key: Option<String>,
    pub cloud_url: Option<String>,
    pub cloud_key: Option<String>,
}

impl StoreConfig {
    /// The cloud credentials and partition, when all three are present and
    /// non-blank.
    pub fn cloud(&self) -> Option<(&str, &str, &str)> {
        fn pick(v: &Option<String>) -> Option<&str> {
            v.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        Some((pick(&self.cloud_url)?, pick(&self.cloud_key)?, pick(&self.sync_key)?))
    }
}

/// Open the cloud store when a sync key and credentials are configured,
/// otherwise the local file.
///
/// A sync key without credentials is a configuration error rather than a
/// silent fallback, so sessions never land in the wrong place.
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn SessionStore>> {
    if let Some((url, key, sync_key)) = config.cloud() {
        info!("Using cloud store for sync key \"{}\"", sync_key);
        return Ok(Box::new(CloudStore::new(url, key, sync_key)?));
    }
    if config.sync_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
        return Err(LedgerError::Config(
            "a sync key is set but the cloud URL or API key is missing".to_string(),
        ));
    }
    info!("Using local store at {}", config.data_file.display());
    Ok(Box::new(LocalStore::new(config.data_file.clone())))
}
