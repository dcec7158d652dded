use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Location used when a session is saved without one.
pub const DEFAULT_LOCATION: &str = "Home Game";

/// Emoji avatars offered when a player has not picked one yet.
pub const AVATARS: &[&str] = &[
    "😎", "🤠", "🤑", "🤡", "🤖", "👽", "👻", "🐯", "🦁", "🐼", "🦊", "🐶", "🐱", "🦈", "🦅", "🦉",
];

/// One player's result within a single session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntry {
    /// Display name; matched across sessions after trimming.
    pub name: String,
    /// Amount brought into the game.
    pub buy_in: f64,
    /// Amount taken out of the game.
    pub cash_out: f64,
}

impl PlayerEntry {
    pub fn new(name: impl Into<String>, buy_in: f64, cash_out: f64) -> Self {
        Self {
            name: name.into(),
            buy_in,
            cash_out,
        }
    }

    /// `cash_out - buy_in`.
    pub fn profit(&self) -> f64 {
        self.cash_out - self.buy_in
    }
}

/// One recorded game, serialized verbatim by every session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokerSession {
    /// Opaque identifier assigned at creation.
    pub id: String,
    /// When the game took place (UTC, RFC 3339 on the wire).
    pub date: DateTime<Utc>,
    /// Free-text venue.
    #[serde(default)]
    pub location: String,
    /// Length of the game in minutes.
    #[serde(default)]
    pub duration_minutes: u32,
    /// Free-text notes; quick-entry sessions keep their raw input here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Per-player results in entry order.
    #[serde(default)]
    pub players: Vec<PlayerEntry>,
}

impl PokerSession {
    /// Sum of every player's buy-in.
    pub fn total_buy_in(&self) -> f64 {
        self.players.iter().map(|p| p.buy_in).sum()
    }

    /// Sum of every player's cash-out.
    pub fn total_cash_out(&self) -> f64 {
        self.players.iter().map(|p| p.cash_out).sum()
    }

    /// Cash-outs minus buy-ins; non-zero means rake or a data-entry error.
    pub fn discrepancy(&self) -> f64 {
        self.total_cash_out() - self.total_buy_in()
    }
}

/// Build a session id from the creation instant (epoch milliseconds).
pub fn new_session_id(now: DateTime<Utc>) -> String {
    now.timestamp_millis().to_string()
}

/// User input for a new or edited session, validated by [`SessionDraft::build`].
#[derive(Debug, Clone)]
pub struct SessionDraft {
    /// Existing id when editing; `None` assigns a fresh one.
    pub id: Option<String>,
    pub date: DateTime<Utc>,
    pub location: String,
    pub duration_minutes: u32,
    pub notes: Option<String>,
    pub players: Vec<PlayerEntry>,
}

impl SessionDraft {
    /// Turn the draft into a session.
    ///
    /// Rows whose trimmed name is empty are dropped and the remaining names
    /// are trimmed. A draft left with no players is rejected with
    /// [`LedgerError::EmptySession`]. A blank location becomes
    /// [`DEFAULT_LOCATION`] and blank notes become `None`.
    pub fn build(self, now: DateTime<Utc>) -> Result<PokerSession> {
        let players: Vec<PlayerEntry> = self
            .players
            .into_iter()
            .filter_map(|p| {
                let name = p.name.trim();
                if name.is_empty() {
                    None
                } else {
                    Some(PlayerEntry::new(name, p.buy_in, p.cash_out))
                }
            })
            .collect();

        if players.is_empty() {
            return Err(LedgerError::EmptySession);
        }

        let location = match self.location.trim() {
            "" => DEFAULT_LOCATION.to_string(),
            other => other.to_string(),
        };

        Ok(PokerSession {
            id: self.id.unwrap_or_else(|| new_session_id(now)),
            date: self.date,
            location,
            duration_minutes: self.duration_minutes,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            players,
        })
    }
}

/// Lifetime performance of one player across a filtered set of sessions.
///
/// Derived on every computation, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStat {
    pub name: String,
    pub total_profit: f64,
    pub total_buy_in: f64,
    pub total_cash_out: f64,
    pub sessions_played: u32,
    pub last_played: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl PlayerStat {
    /// Mean buy-in per session, `0.0` when no sessions were played.
    pub fn average_buy_in(&self) -> f64 {
        if self.sessions_played == 0 {
            return 0.0;
        }
        self.total_buy_in / f64::from(self.sessions_played)
    }

    /// Mean profit per session, `0.0` when no sessions were played.
    pub fn average_profit(&self) -> f64 {
        if self.sessions_played == 0 {
            return 0.0;
        }
        self.total_profit / f64::from(self.sessions_played)
    }
}
