use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone as _, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── Local/UTC conversion ──────────────────────────────────────────────────────

/// Convert a wall-clock time in `tz` to UTC.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times that
/// do not exist (DST spring-forward gap) are shifted forward by one hour.
pub fn local_to_utc(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Calendar date of a UTC instant as seen in `tz`.
pub fn local_date(dt: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    dt.with_timezone(tz).date_naive()
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Handles timezone-aware timestamp parsing and conversion.
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler with the given IANA timezone name as the default.
    ///
    /// `"auto"` resolves to the system timezone. An unrecognised name falls
    /// back to UTC and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let name = if tz_name.eq_ignore_ascii_case("auto") {
            get_system_timezone()
        } else {
            tz_name.to_string()
        };
        let tz = name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                name
            );
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    /// Parse a user-supplied timestamp into a UTC [`DateTime`].
    ///
    /// Accepts RFC 3339 (with `Z` or an offset), naive date-times which are
    /// interpreted in the default timezone, and bare `YYYY-MM-DD` dates which
    /// become local midnight. Returns `None` for empty or unrecognised input.
    pub fn parse_timestamp(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }

        const FMTS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
        ];
        for fmt in FMTS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(local_to_utc(&self.default_tz, naive));
            }
        }

        if let Some(date) = parse_date(s) {
            return Some(local_to_utc(&self.default_tz, date.and_time(chrono::NaiveTime::MIN)));
        }

        warn!("TimezoneHandler: could not parse timestamp \"{}\"", s);
        None
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }

    /// Expose the configured default timezone.
    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }
}

/// Parse a `YYYY-MM-DD` or `DD/MM/YYYY` calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .ok()
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_validate_timezone() {
        assert!(TimezoneHandler::validate_timezone("Asia/Ho_Chi_Minh"));
        assert!(TimezoneHandler::validate_timezone("UTC"));
        assert!(!TimezoneHandler::validate_timezone("Mars/Olympus"));
        assert!(!TimezoneHandler::validate_timezone(""));
    }

    #[test]
    fn test_new_invalid_timezone_falls_back_to_utc() {
        let handler = TimezoneHandler::new("Invalid/Timezone");
        assert_eq!(handler.default_tz(), Tz::UTC);
    }

    #[test]
    fn test_new_valid_timezone() {
        let handler = TimezoneHandler::new("Asia/Ho_Chi_Minh");
        assert_eq!(handler.default_tz(), Tz::Asia__Ho_Chi_Minh);
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let handler = TimezoneHandler::new("UTC");
        let dt = handler.parse_timestamp("2024-01-15T12:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
        let dt = handler.parse_timestamp("2024-01-15T23:00:00.000Z").unwrap();
        assert_eq!(dt.hour(), 23);
    }

    #[test]
    fn test_parse_timestamp_naive_uses_default_zone() {
        let handler = TimezoneHandler::new("Asia/Ho_Chi_Minh");
        // UTC+7 all year.
        let dt = handler.parse_timestamp("2024-01-15 20:30").unwrap();
        assert_eq!(dt.hour(), 13);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_timestamp_bare_date_is_local_midnight() {
        let handler = TimezoneHandler::new("Asia/Ho_Chi_Minh");
        let dt = handler.parse_timestamp("2024-01-15").unwrap();
        assert_eq!(dt.day(), 14);
        assert_eq!(dt.hour(), 17);
        assert_eq!(local_date(dt, &Tz::Asia__Ho_Chi_Minh).day(), 15);
    }

    #[test]
    fn test_parse_timestamp_garbage_returns_none() {
        let handler = TimezoneHandler::new("UTC");
        assert!(handler.parse_timestamp("").is_none());
        assert!(handler.parse_timestamp("not-a-date").is_none());
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("29/02/2024"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert!(parse_date("2023-02-29").is_none());
    }

    #[test]
    fn test_local_to_utc_skips_dst_gap() {
        let tz: Tz = "America/New_York".parse().unwrap();
        // 02:30 on 2024-03-10 does not exist in New York.
        let naive = NaiveDate::from_ymd_opt(2024, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let utc = local_to_utc(&tz, naive);
        assert_eq!(utc.with_timezone(&tz).hour(), 3);
    }

    #[test]
    fn test_get_system_timezone_returns_nonempty_string() {
        assert!(!get_system_timezone().is_empty());
    }
}
