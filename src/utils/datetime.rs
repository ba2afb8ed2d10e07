//! Civil-time helpers. Every timestamp in the system is a naive local
//! date-time, stored and compared exactly as entered.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Parse a `datetime-local` form value (`YYYY-MM-DDTHH:MM`, seconds
/// optional) into a civil timestamp.
pub fn parse_datetime_local(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Parse a bare `YYYY-MM-DD` date from a filter field.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// 00:00:00 on the given day, the inclusive lower bound of a date filter.
pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59 on the given day, the inclusive upper bound of a date filter.
pub fn day_end(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59).expect("23:59:59 is a valid time")
}

/// The current civil time, as the server's wall clock reads it.
pub fn now_civil() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Format a stored timestamp back into the `datetime-local` input format,
/// so edit forms round-trip their values.
pub fn format_datetime_local(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_datetime_local_without_seconds() {
        let ts = parse_datetime_local("2026-11-05T10:00").unwrap();
        assert_eq!(ts.to_string(), "2026-11-05 10:00:00");
    }

    #[test]
    fn parses_datetime_local_with_seconds() {
        let ts = parse_datetime_local("2026-11-05T10:00:30").unwrap();
        assert_eq!(ts.to_string(), "2026-11-05 10:00:30");
    }

    #[test]
    fn rejects_blank_and_garbage() {
        assert!(parse_datetime_local("").is_none());
        assert!(parse_datetime_local("   ").is_none());
        assert!(parse_datetime_local("next tuesday").is_none());
        assert!(parse_datetime_local("2026-13-40T99:99").is_none());
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(day_start(date).to_string(), "2026-03-14 00:00:00");
        assert_eq!(day_end(date).to_string(), "2026-03-14 23:59:59");
    }

    #[test]
    fn datetime_local_round_trips() {
        let raw = "2026-11-05T10:30";
        let parsed = parse_datetime_local(raw).unwrap();
        assert_eq!(format_datetime_local(parsed), raw);
    }
}
