//! Free-text quick entry: one player per line, e.g. `Dat buy 2000 +5000`.
//!
//! Each line needs a name, a buy-in and a cash-out, in that order. Words and
//! symbols between them (`buy`, `mua`, `trả`, `+`, `-`, `:`) are separators
//! only; the second amount is always the absolute cash-out. Lines that do not
//! fit are dropped.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use ledger_core::error::{LedgerError, Result};
use ledger_core::models::{new_session_id, PlayerEntry, PokerSession, DEFAULT_LOCATION};
use ledger_core::time_utils::{local_date, local_to_utc};

/// Duration given to sessions recorded through quick entry.
pub const QUICK_SESSION_MINUTES: u32 = 180;

/// Keywords that end up glued to the name by the greedy name capture.
const NAME_KEYWORDS: &[&str] = &["buy", "b", "mua"];

/// Punctuation treated as a separator between name and amounts.
const NAME_SEPARATORS: &[char] = &[':', '=', '-', '+', ',', ';', '|'];

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)^(?P<name>[^0-9]+?)\s*(?P<buy_in>[0-9]+(?:[.,][0-9]+)?[km]?)[^0-9.]+(?P<cash_out>[0-9]+(?:[.,][0-9]+)?[km]?)",
        )
        .expect("regex is valid")
    })
}

// ── Amount normalisation ──────────────────────────────────────────────────────

/// Turn a shorthand amount into a number.
///
/// The token is lower-cased and `,` is read as a decimal point. A `k` is
/// removed and multiplies by 1,000; an `m` is removed and multiplies by
/// 1,000,000. Returns `None` when what remains is not a finite number.
///
/// ```
/// use ledger_data::quick_entry::normalize_amount;
///
/// assert_eq!(normalize_amount("2k"), Some(2000.0));
/// assert_eq!(normalize_amount("1.5m"), Some(1_500_000.0));
/// assert_eq!(normalize_amount("3,5k"), Some(3500.0));
/// assert_eq!(normalize_amount("abc"), None);
/// ```
pub fn normalize_amount(token: &str) -> Option<f64> {
    let mut value = token.trim().to_lowercase().replace(',', ".");
    let mut multiplier = 1.0;
    if value.contains('k') {
        multiplier = 1_000.0;
        value = value.replacen('k', "", 1);
    }
    if value.contains('m') {
        multiplier = 1_000_000.0;
        value = value.replacen('m', "", 1);
    }
    let parsed = value.parse::<f64>().ok()? * multiplier;
    parsed.is_finite().then_some(parsed)
}

// ── Line parsing ──────────────────────────────────────────────────────────────

/// Strip trailing separators and keyword fragments from a captured name.
fn clean_name(raw: &str) -> String {
    let mut name = raw.trim();
    loop {
        let before = name;
        name = name
            .trim_end_matches(|c: char| c.is_whitespace() || NAME_SEPARATORS.contains(&c));

        let cut = name
            .rfind(|c: char| c.is_whitespace() || NAME_SEPARATORS.contains(&c))
            .map(|i| (&name[..i], &name[i..]));
        if let Some((head, tail)) = cut {
            let word = tail
                .trim_start_matches(|c: char| c.is_whitespace() || NAME_SEPARATORS.contains(&c));
            if NAME_KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k)) && !head.trim().is_empty() {
                name = head;
            }
        }

        if name == before {
            return name.trim().to_string();
        }
    }
}

/// Parse one line into an entry, or `None` when it does not fit.
pub fn parse_quick_line(line: &str) -> Option<PlayerEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let caps = line_pattern().captures(line)?;

    let name = clean_name(&caps["name"]);
    let buy_in = normalize_amount(&caps["buy_in"])?;
    let cash_out = normalize_amount(&caps["cash_out"])?;
    if name.is_empty() {
        return None;
    }
    Some(PlayerEntry::new(name, buy_in, cash_out))
}

/// Parse every line of `text`, keeping the entries in input order.
///
/// Lines that do not fit are skipped; an empty result is valid.
pub fn parse_quick_entries(text: &str) -> Vec<PlayerEntry> {
    text.lines()
        .filter_map(|line| {
            let entry = parse_quick_line(line);
            if entry.is_none() && !line.trim().is_empty() {
                debug!("Skipping unrecognised quick-entry line: {:?}", line);
            }
            entry
        })
        .collect()
}

// ── Control totals ────────────────────────────────────────────────────────────

/// Sums shown next to a parsed preview.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlTotals {
    pub sum_buy_in: f64,
    pub sum_cash_out: f64,
    /// `sum_cash_out - sum_buy_in`; non-zero means rake or a typo.
    pub discrepancy: f64,
}

impl ControlTotals {
    pub fn from_entries(entries: &[PlayerEntry]) -> Self {
        let sum_buy_in: f64 = entries.iter().map(|e| e.buy_in).sum();
        let sum_cash_out: f64 = entries.iter().map(|e| e.cash_out).sum();
        Self {
            sum_buy_in,
            sum_cash_out,
            discrepancy: sum_cash_out - sum_buy_in,
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.discrepancy == 0.0
    }
}

// ── Session assembly ──────────────────────────────────────────────────────────

/// Which evening a quick entry is booked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuickDate {
    #[default]
    Today,
    Yesterday,
}

#[derive(Debug, Clone)]
pub struct QuickSessionOptions {
    pub date: QuickDate,
    pub location: Option<String>,
    pub duration_minutes: u32,
}

impl Default for QuickSessionOptions {
    fn default() -> Self {
        Self {
            date: QuickDate::Today,
            location: None,
            duration_minutes: QUICK_SESSION_MINUTES,
        }
    }
}

/// Parsed quick-entry text with its control totals.
#[derive(Debug, Clone)]
pub struct QuickEntry {
    pub raw: String,
    pub entries: Vec<PlayerEntry>,
    pub totals: ControlTotals,
}

impl QuickEntry {
    pub fn parse(text: &str) -> Self {
        let entries = parse_quick_entries(text);
        let totals = ControlTotals::from_entries(&entries);
        Self {
            raw: text.to_string(),
            entries,
            totals,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a session dated 23:00 local time on the chosen evening.
    ///
    /// The raw text is kept as the notes. Fails with
    /// [`LedgerError::EmptyQuickEntry`] when nothing was recognised; a
    /// non-zero discrepancy does not block saving.
    pub fn into_session(
        self,
        options: &QuickSessionOptions,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<PokerSession> {
        if self.entries.is_empty() {
            return Err(LedgerError::EmptyQuickEntry);
        }

        let today = local_date(now, tz);
        let day = match options.date {
            QuickDate::Today => today,
            QuickDate::Yesterday => today.pred_opt().unwrap_or(today),
        };
        let evening = NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN);

        let location = options
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCATION)
            .to_string();

        Ok(PokerSession {
            id: new_session_id(now),
            date: local_to_utc(tz, day.and_time(evening)),
            location,
            duration_minutes: options.duration_minutes,
            notes: Some(self.raw),
            players: self.entries,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Timelike};

    fn entry(name: &str, buy_in: f64, cash_out: f64) -> PlayerEntry {
        PlayerEntry::new(name, buy_in, cash_out)
    }

    // ── normalize_amount ──────────────────────────────────────────────────────

    #[test]
    fn test_normalize_suffixes() {
        assert_eq!(normalize_amount("2k"), Some(2000.0));
        assert_eq!(normalize_amount("2K"), Some(2000.0));
        assert_eq!(normalize_amount("1.5m"), Some(1_500_000.0));
        assert_eq!(normalize_amount("3,5k"), Some(3500.0));
        assert_eq!(normalize_amount("5000"), Some(5000.0));
    }

    #[test]
    fn test_normalize_rejects_non_numeric() {
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount("k"), None);
        assert_eq!(normalize_amount("1.2.3"), None);
        assert_eq!(normalize_amount("two"), None);
    }

    // ── parse_quick_line ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_line_round_trip() {
        assert_eq!(
            parse_quick_line("Dat buy 2000 +5000"),
            Some(entry("Dat", 2000.0, 5000.0))
        );
    }

    #[test]
    fn test_parse_line_with_suffixes_and_words() {
        assert_eq!(
            parse_quick_line("Tung buy 10k tra 15k"),
            Some(entry("Tung", 10_000.0, 15_000.0))
        );
        assert_eq!(
            parse_quick_line("Hoa mua 1.5m trả 500k"),
            Some(entry("Hoa", 1_500_000.0, 500_000.0))
        );
        assert_eq!(
            parse_quick_line("Minh: 200 return 350"),
            Some(entry("Minh", 200.0, 350.0))
        );
    }

    #[test]
    fn test_parse_line_sign_is_noise() {
        assert_eq!(
            parse_quick_line("Dat buy 2000 -3000"),
            Some(entry("Dat", 2000.0, 3000.0))
        );
        assert_eq!(
            parse_quick_line("Dat b 2000 +0"),
            Some(entry("Dat", 2000.0, 0.0))
        );
    }

    #[test]
    fn test_parse_line_keeps_names_containing_keywords() {
        assert_eq!(
            parse_quick_line("Bob buy 100 200"),
            Some(entry("Bob", 100.0, 200.0))
        );
        assert_eq!(
            parse_quick_line("Anh Ba 100 200"),
            Some(entry("Anh Ba", 100.0, 200.0))
        );
        assert_eq!(
            parse_quick_line("Mua 100 200"),
            Some(entry("Mua", 100.0, 200.0))
        );
    }

    #[test]
    fn test_parse_line_strips_stacked_keywords() {
        assert_eq!(
            parse_quick_line("Dat buy b 100 200"),
            Some(entry("Dat", 100.0, 200.0))
        );
    }

    #[test]
    fn test_parse_line_rejects_single_amount() {
        assert_eq!(parse_quick_line("Dat buy 2000"), None);
    }

    #[test]
    fn test_parse_line_rejects_missing_name() {
        assert_eq!(parse_quick_line("2000 5000"), None);
        assert_eq!(parse_quick_line("   "), None);
        assert_eq!(parse_quick_line("+ 2000 5000"), None);
    }

    // ── parse_quick_entries ───────────────────────────────────────────────────

    #[test]
    fn test_parse_entries_skips_bad_lines_in_order() {
        let text = "Dat buy 2000 +5000\n\nnonsense line\nTung buy 4000 1000\nHoa 2k";
        let entries = parse_quick_entries(text);
        assert_eq!(
            entries,
            vec![entry("Dat", 2000.0, 5000.0), entry("Tung", 4000.0, 1000.0)]
        );
    }

    #[test]
    fn test_parse_entries_handles_crlf() {
        let entries = parse_quick_entries("Dat 1 2\r\nTung 3 4\r\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].cash_out, 4.0);
    }

    #[test]
    fn test_empty_quick_add_blocks_save() {
        let quick = QuickEntry::parse("hello\nno numbers here\n\n");
        assert!(quick.is_empty());
        let err = quick
            .into_session(&QuickSessionOptions::default(), Utc::now(), &Tz::UTC)
            .unwrap_err();
        assert!(matches!(err, LedgerError::EmptyQuickEntry));
    }

    // ── ControlTotals ─────────────────────────────────────────────────────────

    #[test]
    fn test_discrepancy_display_does_not_block_save() {
        let text = "A 5000 4000\nB 5000 5500";
        let quick = QuickEntry::parse(text);
        assert_eq!(quick.totals.sum_buy_in, 10_000.0);
        assert_eq!(quick.totals.sum_cash_out, 9_500.0);
        assert_eq!(quick.totals.discrepancy, -500.0);
        assert!(!quick.totals.is_balanced());

        let session = quick
            .into_session(&QuickSessionOptions::default(), Utc::now(), &Tz::UTC)
            .unwrap();
        assert_eq!(session.players.len(), 2);
    }

    #[test]
    fn test_control_totals_empty() {
        let totals = ControlTotals::from_entries(&[]);
        assert_eq!(totals, ControlTotals::default());
        assert!(totals.is_balanced());
    }

    // ── into_session ──────────────────────────────────────────────────────────

    #[test]
    fn test_into_session_defaults() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap();
        let text = "Dat buy 2000 +5000\nTung buy 4000 1000";
        let session = QuickEntry::parse(text)
            .into_session(&QuickSessionOptions::default(), now, &Tz::UTC)
            .unwrap();

        assert_eq!(session.id, now.timestamp_millis().to_string());
        assert_eq!(session.duration_minutes, 180);
        assert_eq!(session.location, "Home Game");
        assert_eq!(session.notes.as_deref(), Some(text));
        assert_eq!(session.date, Utc.with_ymd_and_hms(2024, 3, 10, 23, 0, 0).unwrap());
    }

    #[test]
    fn test_into_session_yesterday_in_local_zone() {
        let tz = Tz::Asia__Ho_Chi_Minh;
        // 01:00 on 11 March local time.
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap();
        let options = QuickSessionOptions {
            date: QuickDate::Yesterday,
            location: Some("  Club 88 ".to_string()),
            ..Default::default()
        };
        let session = QuickEntry::parse("Dat 1 2")
            .into_session(&options, now, &tz)
            .unwrap();

        let local = session.date.with_timezone(&tz);
        assert_eq!(local.date_naive(), chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(local.hour(), 23);
        assert_eq!(session.location, "Club 88");
    }
}
