//! Session collection manager.
//!
//! [`LedgerService`] holds the sessions last returned by the store. Loading
//! is retried and falls back to the previous collection on failure, so the
//! statistics can always be computed. Mutations propagate store errors and
//! leave the in-memory collection untouched when they fail.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use ledger_core::error::{LedgerError, Result};
use ledger_core::models::{PlayerStat, PokerSession};
use ledger_core::periods::{filter_sessions, Period};
use ledger_core::ranks::{RankLadder, RankTier};
use ledger_data::aggregator::compute_player_stats;
use ledger_data::analytics::{leaderboard, player_history, unique_player_names, DashboardSummary, HistoryPoint};
use ledger_data::store::SessionStore;

/// Maximum number of load attempts per refresh.
const MAX_LOAD_ATTEMPTS: u32 = 3;

/// Dashboard data for one period.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub summary: DashboardSummary,
    pub top_players: Vec<PlayerStat>,
}

/// Query context shared by the derived views.
#[derive(Debug, Clone)]
pub struct ViewContext<'a> {
    pub period: Period,
    pub now: DateTime<Utc>,
    pub tz: Tz,
    pub avatars: &'a HashMap<String, String>,
}

pub struct LedgerService {
    store: Box<dyn SessionStore>,
    ladder: RankLadder,
    sessions: Vec<PokerSession>,
    last_error: Option<String>,
    last_refresh: Option<DateTime<Utc>>,
}

impl LedgerService {
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self::with_ladder(store, RankLadder::default())
    }

    pub fn with_ladder(store: Box<dyn SessionStore>, ladder: RankLadder) -> Self {
        Self {
            store,
            ladder,
            sessions: Vec::new(),
            last_error: None,
            last_refresh: None,
        }
    }

    // ── Collection ────────────────────────────────────────────────────────

    /// Reload from the store.
    ///
    /// Tries up to three times (0, 100, 200 ms back-off). When every attempt
    /// fails the error is recorded in [`LedgerService::last_error`] and the
    /// previous collection is kept.
    pub async fn refresh(&mut self) -> &[PokerSession] {
        let mut last_err = String::new();
        for attempt in 0..MAX_LOAD_ATTEMPTS {
            if attempt > 0 {
                let sleep_ms = u64::from(attempt) * 100;
                tracing::debug!(attempt, sleep_ms, "retrying load after back-off");
                tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
            }
            match self.store.load().await {
                Ok(sessions) => {
                    tracing::debug!(
                        store = self.store.name(),
                        sessions = sessions.len(),
                        "sessions loaded"
                    );
                    self.sessions = sessions;
                    self.last_error = None;
                    self.last_refresh = Some(Utc::now());
                    return &self.sessions;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "load attempt failed");
                    last_err = e.to_string();
                }
            }
        }
        tracing::warn!(
            error = %last_err,
            kept = self.sessions.len(),
            "could not load sessions; keeping previous data"
        );
        self.last_error = Some(last_err);
        &self.sessions
    }

    /// Fails with [`LedgerError::EmptySession`] when the session has no
    /// players.
    pub async fn add(&mut self, session: PokerSession) -> Result<&[PokerSession]> {
        ensure_players(&session)?;
        let updated = self.store.add(&session).await?;
        tracing::info!(id = %session.id, players = session.players.len(), "session added");
        Ok(self.replace(updated))
    }

    /// Fails with [`LedgerError::SessionNotFound`] when the id is not in the
    /// current collection and [`LedgerError::EmptySession`] when the edit
    /// removes every player.
    pub async fn update(&mut self, session: PokerSession) -> Result<&[PokerSession]> {
        self.ensure_known(&session.id)?;
        ensure_players(&session)?;
        let updated = self.store.update(&session).await?;
        tracing::info!(id = %session.id, "session updated");
        Ok(self.replace(updated))
    }

    /// Fails with [`LedgerError::SessionNotFound`] when the id is not in the
    /// current collection.
    pub async fn remove(&mut self, id: &str) -> Result<&[PokerSession]> {
        self.ensure_known(id)?;
        let updated = self.store.remove(id).await?;
        tracing::info!(id, "session removed");
        Ok(self.replace(updated))
    }

    pub fn sessions(&self) -> &[PokerSession] {
        &self.sessions
    }

    pub fn find(&self, id: &str) -> Option<&PokerSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    fn ensure_known(&self, id: &str) -> Result<()> {
        if self.find(id).is_none() {
            return Err(LedgerError::SessionNotFound(id.to_string()));
        }
        Ok(())
    }

    fn replace(&mut self, sessions: Vec<PokerSession>) -> &[PokerSession] {
        self.sessions = sessions;
        self.last_error = None;
        &self.sessions
    }

    // ── Derived views ─────────────────────────────────────────────────────

    pub fn ladder(&self) -> &RankLadder {
        &self.ladder
    }

    pub fn rank_of(&self, profit: f64) -> &RankTier {
        self.ladder.rank_of(profit)
    }

    pub fn stats(&self, ctx: &ViewContext<'_>) -> Vec<PlayerStat> {
        compute_player_stats(&self.sessions, &ctx.period, ctx.now, &ctx.tz, ctx.avatars)
    }

    /// Sessions in the period, newest first.
    pub fn history(&self, ctx: &ViewContext<'_>) -> Vec<PokerSession> {
        filter_sessions(&self.sessions, &ctx.period, ctx.now, &ctx.tz)
    }

    pub fn dashboard(&self, ctx: &ViewContext<'_>, top: usize) -> DashboardView {
        let sessions = self.history(ctx);
        let stats = self.stats(ctx);
        DashboardView {
            summary: DashboardSummary::new(&sessions, &stats),
            top_players: leaderboard(&stats, top).to_vec(),
        }
    }

    /// Cumulative profit of one player over every stored session.
    pub fn player_history(&self, name: &str) -> Vec<HistoryPoint> {
        player_history(&self.sessions, name)
    }

    pub fn player_names(&self) -> Vec<String> {
        unique_player_names(&self.sessions)
    }
}

fn ensure_players(session: &PokerSession) -> Result<()> {
    if session.players.is_empty() {
        return Err(LedgerError::EmptySession);
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
