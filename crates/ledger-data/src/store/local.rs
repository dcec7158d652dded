use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use ledger_core::error::{LedgerError, Result};
use ledger_core::models::PokerSession;

use super::SessionStore;

/// Sessions kept as a JSON array in one file, newest additions first.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<PokerSession>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(LedgerError::FileRead {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Write to a sibling temp file, then rename over the target.
    async fn write_all(&self, sessions: &[PokerSession]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(sessions)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Wrote {} sessions to {}", sessions.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SessionStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn load(&self) -> Result<Vec<PokerSession>> {
        self.read_all().await
    }

    async fn add(&self, session: &PokerSession) -> Result<Vec<PokerSession>> {
        let mut sessions = self.read_all().await?;
        sessions.insert(0, session.clone());
        self.write_all(&sessions).await?;
        Ok(sessions)
    }

    async fn update(&self, session: &PokerSession) -> Result<Vec<PokerSession>> {
        let mut sessions = self.read_all().await?;
        for s in sessions.iter_mut().filter(|s| s.id == session.id) {
            *s = session.clone();
        }
        self.write_all(&sessions).await?;
        Ok(sessions)
    }

    async fn remove(&self, id: &str) -> Result<Vec<PokerSession>> {
        let mut sessions = self.read_all().await?;
        sessions.retain(|s| s.id != id);
        self.write_all(&sessions).await?;
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Utc};
    use ledger_core::models::PlayerEntry;
    use tempfile::TempDir;

    fn make_session(id: &str, cash_out: f64) -> PokerSession {
        PokerSession {
            id: id.to_string(),
            date: Utc.with_ymd_and_hms(2024, 4, 1, 23, 0, 0).unwrap(),
            location: "Home Game".to_string(),
            duration_minutes: 180,
            notes: None,
            players: vec![PlayerEntry::new("Dat", 1000.0, cash_out)],
        }
    }

    fn store_in(tmp: &TempDir) -> LocalStore {
        LocalStore::new(tmp.path().join("data").join("sessions.json"))
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(store_in(&tmp).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_prepends_and_persists() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);

        store.add(&make_session("1", 0.0)).await.unwrap();
        let after = store.add(&make_session("2", 0.0)).await.unwrap();
        assert_eq!(after[0].id, "2");
        assert_eq!(after[1].id, "1");

        let reopened = store_in(&tmp).load().await.unwrap();
        assert_eq!(reopened, after);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_update_replaces_by_id() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.add(&make_session("1", 0.0)).await.unwrap();
        store.add(&make_session("2", 0.0)).await.unwrap();

        let after = store.update(&make_session("1", 5000.0)).await.unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after[1].players[0].cash_out, 5000.0);
        assert_eq!(after[0].players[0].cash_out, 0.0);
    }

    #[tokio::test]
    async fn test_remove_filters_by_id() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        store.add(&make_session("1", 0.0)).await.unwrap();
        store.add(&make_session("2", 0.0)).await.unwrap();

        let after = store.remove("1").await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, "2");

        let unchanged = store.remove("missing").await.unwrap();
        assert_eq!(unchanged, after);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error_and_left_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "[{broken").unwrap();

        assert!(matches!(store.load().await, Err(LedgerError::JsonParse(_))));
        assert!(store.add(&make_session("1", 0.0)).await.is_err());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "[{broken");
    }

    #[tokio::test]
    async fn test_reads_web_client_export() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(
            store.path(),
            r#"[{"id":"1714600000000","date":"2024-05-01T16:00:00.000Z","location":"Home Game",
                "durationMinutes":180,"players":[{"name":"Tung","buyIn":10000,"cashOut":15000}]}]"#,
        )
        .unwrap();

        let sessions = store.load().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].players[0].profit(), 5000.0);
        assert!(sessions[0].notes.is_none());
    }
}
