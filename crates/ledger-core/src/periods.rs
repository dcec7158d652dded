//! Time windows applied to sessions before aggregation.
//!
//! Calendar comparisons are made in one explicit [`Tz`] so that "this month"
//! means the same thing whatever zone the host clock is in.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::models::PokerSession;
use crate::time_utils::{local_date, local_to_utc};

// ── DateRange ─────────────────────────────────────────────────────────────────

/// Inclusive calendar-day range for the custom period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Fails with [`LedgerError::InvalidDateRange`] when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(LedgerError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// UTC instants for 00:00:00.000 of the first day and 23:59:59.999 of
    /// the last day, both in `tz`.
    pub fn bounds(&self, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = local_to_utc(tz, self.start.and_time(NaiveTime::MIN));
        let end_of_day =
            NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        let end = local_to_utc(tz, self.end.and_time(end_of_day));
        (start, end)
    }

    /// Whether `date` lies within the range, both ends inclusive.
    pub fn contains(&self, date: DateTime<Utc>, tz: &Tz) -> bool {
        let (start, end) = self.bounds(tz);
        date >= start && date <= end
    }
}

// ── Period ────────────────────────────────────────────────────────────────────

/// Which sessions feed the statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    All,
    Today,
    Yesterday,
    /// Trailing seven days from `now`.
    Week,
    /// Current calendar month.
    Month,
    /// Current calendar year.
    Year,
    Custom(DateRange),
}

impl Period {
    /// Whether a session dated `date` belongs to this window at `now`.
    pub fn contains(&self, date: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> bool {
        match self {
            Period::All => true,
            Period::Today => local_date(date, tz) == local_date(now, tz),
            Period::Yesterday => {
                let today = local_date(now, tz);
                today.pred_opt() == Some(local_date(date, tz))
            }
            Period::Week => date >= now - Duration::days(7),
            Period::Month => {
                let d = local_date(date, tz);
                let n = local_date(now, tz);
                d.year() == n.year() && d.month() == n.month()
            }
            Period::Year => local_date(date, tz).year() == local_date(now, tz).year(),
            Period::Custom(range) => range.contains(date, tz),
        }
    }

    /// Short name used on the command line and in preferences.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::All => "all",
            Period::Today => "today",
            Period::Yesterday => "yesterday",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
            Period::Custom(_) => "custom",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Custom(range) => write!(f, "{} to {}", range.start, range.end),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for Period {
    type Err = LedgerError;

    /// Parses the named windows. A custom range is built with
    /// [`DateRange::new`] instead.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Period::All),
            "today" => Ok(Period::Today),
            "yesterday" => Ok(Period::Yesterday),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            _ => Err(LedgerError::InvalidPeriod(s.to_string())),
        }
    }
}

// ── Filtering ─────────────────────────────────────────────────────────────────

/// Sessions inside `period`, newest first.
pub fn filter_sessions(
    sessions: &[PokerSession],
    period: &Period,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Vec<PokerSession> {
    let mut kept: Vec<PokerSession> = sessions
        .iter()
        .filter(|s| period.contains(s.date, now, tz))
        .cloned()
        .collect();
    kept.sort_by(|a, b| b.date.cmp(&a.date));
    kept
}
