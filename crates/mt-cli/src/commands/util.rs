//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use mt_core::{MachineId, TimeRange};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").expect("valid relative time pattern")
});

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a datetime string as either ISO 8601 or relative to `now`.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime(s: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::minutes(n * minutes_per_unit))
}

/// Parses `[from, to)`, open-ended when `to` is absent.
pub fn parse_range(from: &str, to: Option<&str>, now: DateTime<Utc>) -> anyhow::Result<TimeRange> {
    let lower = parse_datetime(from, now)?;
    let upper = to.map(|t| parse_datetime(t, now)).transpose()?;
    TimeRange::new(Some(lower), upper, true, false).context("invalid time range")
}

pub fn parse_machine(machine: &str) -> anyhow::Result<MachineId> {
    MachineId::new(machine).context("invalid machine")
}

/// Formats seconds as "Xh Ym Zs", dropping leading zero units.
#[expect(
    clippy::cast_possible_truncation,
    reason = "whole seconds of a running time fit in i64"
)]
pub fn format_seconds(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0s".to_string();
    }
    let total = seconds.floor() as i64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// Formats a share in `[0, 1]` as a percentage with one decimal.
pub fn format_percent(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap()
    }

    #[test]
    fn parses_iso_and_relative_times() {
        assert_eq!(
            parse_datetime("2025-03-10T08:00:00Z", now()).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("2025-03-10T09:00:00+01:00", now()).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("2 hours ago", now()).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap()
        );
        assert_eq!(
            parse_datetime("1 day ago", now()).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 9, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_garbage_and_huge_relative_times() {
        assert!(parse_datetime("yesterday", now()).is_err());
        assert!(parse_datetime("99999999999 weeks ago", now()).is_err());
    }

    #[test]
    fn parse_range_rejects_inverted_bounds() {
        assert!(parse_range("2025-03-10T09:00:00Z", Some("2025-03-10T08:00:00Z"), now()).is_err());
        let open = parse_range("2025-03-10T09:00:00Z", None, now()).unwrap();
        assert!(open.is_upper_unbounded());
    }

    #[test]
    fn formats_durations_and_shares() {
        assert_eq!(format_seconds(0.0), "0s");
        assert_eq!(format_seconds(59.9), "59s");
        assert_eq!(format_seconds(3725.0), "1h 2m 5s");
        assert_eq!(format_seconds(600.0), "10m 0s");
        assert_eq!(format_percent(0.366_666), "36.7%");
        assert_eq!(format_percent(1.0), "100.0%");
    }
}
