//! Per-player statistics over a collection of sessions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use ledger_core::models::{PlayerEntry, PlayerStat, PokerSession};
use ledger_core::periods::{filter_sessions, Period};

// ── Accumulator ───────────────────────────────────────────────────────────────

/// Running totals for one player while sessions are folded in.
#[derive(Debug, Clone)]
struct PlayerAccumulator {
    name: String,
    total_buy_in: f64,
    total_cash_out: f64,
    sessions_played: u32,
    last_played: DateTime<Utc>,
}

impl PlayerAccumulator {
    fn new(name: &str, first_seen: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            total_buy_in: 0.0,
            total_cash_out: 0.0,
            sessions_played: 0,
            last_played: first_seen,
        }
    }

    fn add_entry(&mut self, entry: &PlayerEntry, date: DateTime<Utc>) {
        self.total_buy_in += entry.buy_in;
        self.total_cash_out += entry.cash_out;
        self.sessions_played += 1;
        if date > self.last_played {
            self.last_played = date;
        }
    }

    fn finish(self, avatars: &HashMap<String, String>) -> PlayerStat {
        PlayerStat {
            avatar: avatars.get(&self.name).cloned(),
            // Derived from the two totals so the identity holds exactly.
            total_profit: self.total_cash_out - self.total_buy_in,
            total_buy_in: self.total_buy_in,
            total_cash_out: self.total_cash_out,
            sessions_played: self.sessions_played,
            last_played: self.last_played,
            name: self.name,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Fold `sessions` into one [`PlayerStat`] per distinct trimmed player name,
/// sorted by total profit, highest first.
///
/// Entries with a blank name are skipped. A name appearing twice in one
/// session is counted twice. Players with equal profit keep the order in
/// which they were first encountered. `avatars` maps player names to the
/// emoji shown next to them.
pub fn aggregate_player_stats(
    sessions: &[PokerSession],
    avatars: &HashMap<String, String>,
) -> Vec<PlayerStat> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut accumulators: Vec<PlayerAccumulator> = Vec::new();

    for session in sessions {
        for entry in &session.players {
            let name = entry.name.trim();
            if name.is_empty() {
                continue;
            }
            let slot = match index.get(name) {
                Some(&i) => i,
                None => {
                    accumulators.push(PlayerAccumulator::new(name, session.date));
                    index.insert(name.to_string(), accumulators.len() - 1);
                    accumulators.len() - 1
                }
            };
            accumulators[slot].add_entry(entry, session.date);
        }
    }

    let mut stats: Vec<PlayerStat> = accumulators
        .into_iter()
        .map(|acc| acc.finish(avatars))
        .collect();
    stats.sort_by(|a, b| b.total_profit.total_cmp(&a.total_profit));

    debug!(
        "Aggregated {} players from {} sessions",
        stats.len(),
        sessions.len()
    );
    stats
}

/// Filter `sessions` to `period` at `now` in `tz`, then aggregate.
pub fn compute_player_stats(
    sessions: &[PokerSession],
    period: &Period,
    now: DateTime<Utc>,
    tz: &Tz,
    avatars: &HashMap<String, String>,
) -> Vec<PlayerStat> {
    let filtered = filter_sessions(sessions, period, now, tz);
    aggregate_player_stats(&filtered, avatars)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
