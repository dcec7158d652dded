use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ledger_core::error::{LedgerError, Result};
use ledger_core::models::PokerSession;

use super::SessionStore;

/// Remote table holding one row per session.
pub const TABLE_NAME: &str = "poker_sessions";

/// One row of the sessions table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudRow {
    pub id: String,
    pub user_key: String,
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Serialize)]
struct DataPatch<'a> {
    data: &'a PokerSession,
}

/// Sessions in a shared REST table, partitioned by sync key.
#[derive(Debug, Clone)]
pub struct CloudStore {
    http: Client,
    table_url: String,
    api_key: String,
    user_key: String,
}

fn storage_error(e: reqwest::Error) -> LedgerError {
    LedgerError::Storage(e.to_string())
}

impl CloudStore {
    /// `base_url` is the project URL; rows live under `/rest/v1/poker_sessions`.
    pub fn new(base_url: &str, api_key: &str, user_key: &str) -> Result<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(LedgerError::Config(format!(
                "cloud URL must start with http:// or https://: {base_url}"
            )));
        }
        Ok(Self {
            http: Client::new(),
            table_url: format!("{base}/rest/v1/{TABLE_NAME}"),
            api_key: api_key.to_string(),
            user_key: user_key.to_string(),
        })
    }

    pub fn table_url(&self) -> &str {
        &self.table_url
    }

    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Query parameters selecting this partition, newest rows first.
    fn list_query(&self) -> [(&'static str, String); 3] {
        [
            ("select", "*".to_string()),
            ("user_key", format!("eq.{}", self.user_key)),
            ("order", "created_at.desc".to_string()),
        ]
    }

    /// Query parameters selecting one row of this partition.
    fn row_query(&self, id: &str) -> [(&'static str, String); 2] {
        [
            ("id", format!("eq.{id}")),
            ("user_key", format!("eq.{}", self.user_key)),
        ]
    }

    fn row_for(&self, session: &PokerSession) -> Result<CloudRow> {
        Ok(CloudRow {
            id: session.id.clone(),
            user_key: self.user_key.clone(),
            data: serde_json::to_value(session)?,
            created_at: None,
        })
    }

    async fn fetch_rows(&self) -> Result<Vec<CloudRow>> {
        let resp = self
            .authed(self.http.get(&self.table_url))
            .query(&self.list_query())
            .send()
            .await
            .map_err(storage_error)?
            .error_for_status()
            .map_err(storage_error)?;
        resp.json().await.map_err(storage_error)
    }
}

/// Decode rows into sessions, skipping any whose payload is malformed.
pub fn sessions_from_rows(rows: Vec<CloudRow>) -> Vec<PokerSession> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<PokerSession>(row.data) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Skipping cloud row {}: {}", row.id, e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl SessionStore for CloudStore {
    fn name(&self) -> &str {
        "cloud"
    }

    async fn load(&self) -> Result<Vec<PokerSession>> {
        let rows = self.fetch_rows().await?;
        debug!("Fetched {} cloud rows", rows.len());
        Ok(sessions_from_rows(rows))
    }

    async fn add(&self, session: &PokerSession) -> Result<Vec<PokerSession>> {
        let row = self.row_for(session)?;
        self.authed(self.http.post(&self.table_url))
            .json(&row)
            .send()
            .await
            .map_err(storage_error)?
            .error_for_status()
            .map_err(storage_error)?;
        self.load().await
    }

    async fn update(&self, session: &PokerSession) -> Result<Vec<PokerSession>> {
        self.authed(self.http.patch(&self.table_url))
            .query(&self.row_query(&session.id))
            .json(&DataPatch { data: session })
            .send()
            .await
            .map_err(storage_error)?
            .error_for_status()
            .map_err(storage_error)?;
        self.load().await
    }

    async fn remove(&self, id: &str) -> Result<Vec<PokerSession>> {
        self.authed(self.http.delete(&self.table_url))
            .query(&self.row_query(id))
            .send()
            .await
            .map_err(storage_error)?
            .error_for_status()
            .map_err(storage_error)?;
        self.load().await
    }
}
