//! Derived views behind the dashboard, player detail and history screens.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use ledger_core::models::{PlayerEntry, PlayerStat, PokerSession};

// ── Dashboard ─────────────────────────────────────────────────────────────────

/// Sum of every buy-in across `sessions`.
pub fn total_volume(sessions: &[PokerSession]) -> f64 {
    sessions.iter().map(PokerSession::total_buy_in).sum()
}

/// Headline numbers for the selected period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_sessions: usize,
    pub total_volume: f64,
    pub distribution: ProfitDistribution,
}

impl DashboardSummary {
    pub fn new(sessions: &[PokerSession], stats: &[PlayerStat]) -> Self {
        Self {
            total_sessions: sessions.len(),
            total_volume: total_volume(sessions),
            distribution: ProfitDistribution::from_stats(stats),
        }
    }
}

/// The first `n` players of an already sorted stats list.
pub fn leaderboard(stats: &[PlayerStat], n: usize) -> &[PlayerStat] {
    &stats[..n.min(stats.len())]
}

/// How many players are up, down or even.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProfitDistribution {
    pub winners: usize,
    pub losers: usize,
    pub break_even: usize,
}

impl ProfitDistribution {
    pub fn from_stats(stats: &[PlayerStat]) -> Self {
        stats.iter().fold(Self::default(), |mut acc, s| {
            if s.total_profit > 0.0 {
                acc.winners += 1;
            } else if s.total_profit < 0.0 {
                acc.losers += 1;
            } else {
                acc.break_even += 1;
            }
            acc
        })
    }
}

// ── Sessions ──────────────────────────────────────────────────────────────────

/// The entry with the highest profit; the first one wins a tie.
pub fn session_winner(session: &PokerSession) -> Option<&PlayerEntry> {
    session.players.iter().fold(None, |best: Option<&PlayerEntry>, p| match best {
        Some(b) if b.profit() >= p.profit() => Some(b),
        _ => Some(p),
    })
}

/// Distinct trimmed player names, sorted.
pub fn unique_player_names(sessions: &[PokerSession]) -> Vec<String> {
    sessions
        .iter()
        .flat_map(|s| s.players.iter())
        .map(|p| p.name.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ── Player history ────────────────────────────────────────────────────────────

/// One point on a player's cumulative profit curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub session_id: String,
    pub date: DateTime<Utc>,
    pub profit: f64,
    pub cumulative: f64,
}

/// Per-session profit and running total for `name`, oldest first.
///
/// Sessions without the player are skipped. If the name appears more than
/// once in a session the entries are summed, matching the aggregator.
pub fn player_history(sessions: &[PokerSession], name: &str) -> Vec<HistoryPoint> {
    let name = name.trim();
    let mut played: Vec<(&PokerSession, f64)> = sessions
        .iter()
        .filter_map(|s| {
            let mut entries = s.players.iter().filter(|p| p.name.trim() == name).peekable();
            entries.peek()?;
            Some((s, entries.map(PlayerEntry::profit).sum()))
        })
        .collect();
    played.sort_by_key(|(s, _)| s.date);

    let mut running = 0.0;
    played
        .into_iter()
        .map(|(s, profit)| {
            running += profit;
            HistoryPoint {
                session_id: s.id.clone(),
                date: s.date,
                profit,
                cumulative: running,
            }
        })
        .collect()
}
