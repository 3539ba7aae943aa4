//! Pure helpers for the channel list (no I/O, no shared state).

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Comment stored when the operator leaves the field blank.
pub const EMPTY_COMMENT: &str = "no";
/// Days pre-filled in the add-days dialog.
pub const DEFAULT_EXTEND_DAYS: i64 = 7;

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a backend timestamp.
///
/// Offset-qualified values are taken as-is, date-time values without an offset
/// are read in `tz`, and bare dates are midnight UTC.
#[must_use]
pub fn parse_timestamp<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return tz
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Local midnight at the start of the day before `now`.
#[must_use]
pub fn start_of_yesterday<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let yesterday = now.date_naive().pred_opt()?;
    let midnight = yesterday.and_hms_opt(0, 0, 0)?;
    now.timezone().from_local_datetime(&midnight).earliest()
}

/// Whether `active_till` lies strictly before the start of yesterday.
///
/// Unparseable timestamps are never expired.
#[must_use]
pub fn is_before_yesterday<Tz: TimeZone>(active_till: &str, now: &DateTime<Tz>) -> bool {
    let Some(threshold) = start_of_yesterday(now) else {
        return false;
    };
    parse_timestamp(active_till, &now.timezone())
        .is_some_and(|expiry| expiry < threshold.with_timezone(&Utc))
}

/// Render a timestamp as its UTC `YYYY-MM-DD` date, or echo it when unparseable.
#[must_use]
pub fn format_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> String {
    parse_timestamp(raw, tz).map_or_else(
        || raw.to_string(),
        |parsed| parsed.format("%Y-%m-%d").to_string(),
    )
}

/// Trim an add-days comment, substituting [`EMPTY_COMMENT`] when blank.
#[must_use]
pub fn normalize_comment(comment: &str) -> String {
    let trimmed = comment.trim();
    if trimmed.is_empty() {
        EMPTY_COMMENT.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Read the leading integer of a days input, yielding 0 when there is none.
///
/// `"12abc"` reads as 12 and `"abc"` as 0. Overflowing values also read as 0.
#[must_use]
pub fn parse_days_input(input: &str) -> i64 {
    let trimmed = input.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => ("-", &trimmed[1..]),
        Some(b'+') => ("", &trimmed[1..]),
        _ => ("", trimmed),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return 0;
    }
    format!("{sign}{digits}").parse().unwrap_or(0)
}

/// Whether the channel tier gets the premium badge.
#[must_use]
pub fn is_premium(mode: &str) -> bool {
    mode.eq_ignore_ascii_case("premium")
}
