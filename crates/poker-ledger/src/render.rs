//! Plain-text rendering of ledger views for the terminal.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono_tz::Tz;
use unicode_width::UnicodeWidthStr;

use ledger_core::formatting::{
    format_number, format_short_amount, format_signed_short, format_time, format_vnd, percentage,
    string_to_color,
};
use ledger_core::models::{PlayerStat, PokerSession};
use ledger_core::ranks::RankLadder;
use ledger_data::analytics::{session_winner, HistoryPoint};
use ledger_data::quick_entry::QuickEntry;
use ledger_runtime::ledger::DashboardView;

const DATE_FORMAT: &str = "%d/%m/%Y";

// ── Column helpers ────────────────────────────────────────────────────────────

/// Left-align `s` to `width` terminal columns.
fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(w)))
}

/// Right-align `s` to `width` terminal columns.
fn pad_left(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{}{}", " ".repeat(width.saturating_sub(w)), s)
}

fn initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

fn avatar_or_initial(stat: &PlayerStat) -> String {
    stat.avatar.clone().unwrap_or_else(|| initial(&stat.name))
}

fn name_width(stats: &[PlayerStat]) -> usize {
    stats
        .iter()
        .map(|s| UnicodeWidthStr::width(s.name.as_str()))
        .max()
        .unwrap_or(0)
        .max(4)
}

// ── Views ─────────────────────────────────────────────────────────────────────

/// Leaderboard with rank, profit and session counts.
pub fn stats_table(stats: &[PlayerStat], ladder: &RankLadder, tz: &Tz) -> String {
    if stats.is_empty() {
        return "No sessions in this period.\n".to_string();
    }
    let nw = name_width(stats);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  {}  {}  {}  {}  {}",
        pad_left("#", 3),
        pad("Name", nw + 4),
        pad("Rank", 16),
        pad_left("Profit", 16),
        pad_left("Games", 5),
        "Last played"
    );
    for (i, stat) in stats.iter().enumerate() {
        let tier = ladder.rank_of(stat.total_profit);
        let _ = writeln!(
            out,
            "{}  {}  {}  {}  {}  {}",
            pad_left(&(i + 1).to_string(), 3),
            pad(&format!("{} {}", avatar_or_initial(stat), stat.name), nw + 4),
            pad(&format!("{} {}", tier.icon, tier.name), 16),
            pad_left(&format_vnd(stat.total_profit), 16),
            pad_left(&stat.sessions_played.to_string(), 5),
            stat.last_played.with_timezone(tz).format(DATE_FORMAT)
        );
    }
    out
}

pub fn dashboard(view: &DashboardView, ladder: &RankLadder) -> String {
    let summary = &view.summary;
    let dist = summary.distribution;
    let players = dist.winners + dist.losers + dist.break_even;
    let mut out = String::new();

    let _ = writeln!(out, "Sessions:     {}", summary.total_sessions);
    let _ = writeln!(out, "Total volume: {}", format_short_amount(summary.total_volume));
    let _ = writeln!(
        out,
        "Players:      {} up ({}%), {} down, {} even",
        dist.winners,
        percentage(dist.winners as f64, players as f64, 1),
        dist.losers,
        dist.break_even
    );

    if !view.top_players.is_empty() {
        let nw = name_width(&view.top_players);
        let _ = writeln!(out, "\nTop players");
        for (i, stat) in view.top_players.iter().enumerate() {
            let tier = ladder.rank_of(stat.total_profit);
            let _ = writeln!(
                out,
                "{}. {} {}  {}  {}",
                i + 1,
                avatar_or_initial(stat),
                pad(&stat.name, nw),
                pad_left(&format_signed_short(stat.total_profit), 8),
                tier.icon
            );
        }
    }
    out
}

/// One line per session: date, venue, length, volume, winner and any
/// discrepancy between buy-ins and cash-outs.
pub fn history(sessions: &[PokerSession], tz: &Tz) -> String {
    if sessions.is_empty() {
        return "No sessions in this period.\n".to_string();
    }
    let mut out = String::new();
    for session in sessions {
        let winner = session_winner(session)
            .map(|p| format!("{} {}", p.name, format_signed_short(p.profit())))
            .unwrap_or_else(|| "-".to_string());
        let _ = write!(
            out,
            "{}  {}  {}  {}  {} players  vol {}  top {}",
            session.id,
            session.date.with_timezone(tz).format("%d/%m/%Y %H:%M"),
            pad(&session.location, 12),
            pad_left(&format_time(f64::from(session.duration_minutes)), 6),
            session.players.len(),
            format_short_amount(session.total_buy_in()),
            winner
        );
        let diff = session.discrepancy();
        if diff != 0.0 {
            let _ = write!(out, "  (off by {})", format_vnd(diff));
        }
        out.push('\n');
    }
    out
}

pub fn player_detail(
    stat: &PlayerStat,
    history: &[HistoryPoint],
    ladder: &RankLadder,
    tz: &Tz,
) -> String {
    let tier = ladder.rank_of(stat.total_profit);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}  [{}]",
        avatar_or_initial(stat),
        stat.name,
        string_to_color(&stat.name)
    );
    let _ = writeln!(out, "Rank:         {} {}", tier.icon, tier.name);
    if let Some((next, needed)) = ladder.next_tier(stat.total_profit) {
        let _ = writeln!(
            out,
            "Next rank:    {} {} in {}",
            next.icon,
            next.name,
            format_vnd(needed)
        );
    }
    let _ = writeln!(out, "Total profit: {}", format_vnd(stat.total_profit));
    let _ = writeln!(out, "Total buy-in: {}", format_vnd(stat.total_buy_in));
    let _ = writeln!(out, "Games:        {}", stat.sessions_played);
    let _ = writeln!(out, "Avg buy-in:   {}", format_vnd(stat.average_buy_in()));

    if !history.is_empty() {
        let _ = writeln!(out, "\nHistory");
        for point in history {
            let _ = writeln!(
                out,
                "{}  {}  {}",
                point.date.with_timezone(tz).format("%d/%m"),
                pad_left(&format_signed_short(point.profit), 8),
                pad_left(&format_signed_short(point.cumulative), 8)
            );
        }
    }
    out
}

/// One name per line, each with its avatar or initial and colour.
pub fn player_list(names: &[String], avatars: &HashMap<String, String>) -> String {
    if names.is_empty() {
        return "No players yet.\n".to_string();
    }
    let nw = names
        .iter()
        .map(|n| UnicodeWidthStr::width(n.as_str()))
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for name in names {
        let badge = avatars.get(name).cloned().unwrap_or_else(|| initial(name));
        let _ = writeln!(out, "{} {}  {}", badge, pad(name, nw), string_to_color(name));
    }
    out
}

/// Parsed quick-entry preview with control totals.
pub fn quick_preview(quick: &QuickEntry) -> String {
    if quick.is_empty() {
        return "No player lines recognised.\n".to_string();
    }
    let nw = quick
        .entries
        .iter()
        .map(|e| UnicodeWidthStr::width(e.name.as_str()))
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for entry in &quick.entries {
        let _ = writeln!(
            out,
            "{}  {} -> {}  {}",
            pad(&entry.name, nw),
            pad_left(&format_number(entry.buy_in, 0), 12),
            pad_left(&format_number(entry.cash_out, 0), 12),
            format_signed_short(entry.profit())
        );
    }
    let totals = quick.totals;
    let _ = writeln!(
        out,
        "Buy-ins {}  Cash-outs {}",
        format_vnd(totals.sum_buy_in),
        format_vnd(totals.sum_cash_out)
    );
    if !totals.is_balanced() {
        let _ = writeln!(out, "Discrepancy: {}", format_vnd(totals.discrepancy));
    }
    out
}

pub fn rank_info(profit: f64, ladder: &RankLadder) -> String {
    let tier = ladder.rank_of(profit);
    let mut out = format!("{} {}\n", tier.icon, tier.name);
    match ladder.next_tier(profit) {
        Some((next, needed)) => {
            let _ = writeln!(
                out,
                "{} more to {} {}",
                format_number(needed, 0),
                next.icon,
                next.name
            );
        }
        None => out.push_str("Top of the ladder\n"),
    }
    out
}
