//! Number, currency and duration formatting for terminal output.

/// Format `value` with `,` thousands separators and exactly `decimals`
/// fractional digits.
///
/// # Examples
///
/// ```
/// use ledger_core::formatting::format_number;
///
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(-1500.5, 1), "-1,500.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let negative = value < 0.0;
    let factor = 10_f64.powi(decimals as i32);
    let abs_value = value.abs();
    // Half-ULP nudge so exact midpoints round away from zero.
    let rounded = ((abs_value * factor) + f64::EPSILON * abs_value * factor).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let mut out = group_thousands(&integer_part.to_string(), ',');
    if decimals > 0 {
        let frac = format!("{:.prec$}", rounded.fract(), prec = decimals as usize);
        out.push_str(frac.trim_start_matches('0'));
    }

    if negative && rounded != 0.0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// Whole-dong amount in Vietnamese notation: `.` grouping and a trailing `₫`.
///
/// ```
/// use ledger_core::formatting::format_vnd;
///
/// assert_eq!(format_vnd(1234567.0), "1.234.567 ₫");
/// assert_eq!(format_vnd(-500.0), "-500 ₫");
/// ```
pub fn format_vnd(value: f64) -> String {
    let rounded = value.round();
    let grouped = group_thousands(&(rounded.abs() as u64).to_string(), '.');
    if rounded < 0.0 {
        format!("-{} ₫", grouped)
    } else {
        format!("{} ₫", grouped)
    }
}

/// Compact amount for chart axes and narrow columns.
///
/// Millions get one decimal and an `M`, thousands are rounded to a whole `k`,
/// anything smaller is printed as-is.
pub fn format_short_amount(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.0}k", value / 1_000.0)
    } else {
        format!("{}", value)
    }
}

/// [`format_short_amount`] with an explicit `+` on gains.
pub fn format_signed_short(value: f64) -> String {
    if value > 0.0 {
        format!("+{}", format_short_amount(value))
    } else {
        format_short_amount(value)
    }
}

/// Render a duration in minutes as `"45m"`, `"3h"` or `"3h 45m"`.
pub fn format_time(minutes: f64) -> String {
    let total = minutes.round() as i64;
    match (total / 60, total % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// `(part / whole) * 100` rounded to `decimal_places`; `0.0` when `whole` is
/// zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let factor = 10_f64.powi(decimal_places as i32);
    ((part / whole) * 100.0 * factor).round() / factor
}

/// Stable `#RRGGBB` colour derived from a player name.
///
/// Uses the 32-bit `h * 31 + c` string hash over UTF-16 code units so the
/// same name always gets the same colour as in the web client.
pub fn string_to_color(name: &str) -> String {
    let hash = name
        .encode_utf16()
        .fold(0_i32, |h, c| i32::from(c).wrapping_add(h.wrapping_shl(5).wrapping_sub(h)));
    format!("#{:06X}", hash & 0x00ff_ffff)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn group_thousands(digits: &str, sep: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (len - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}
