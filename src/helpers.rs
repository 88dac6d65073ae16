//! Calendar key helpers.
//!
//! Tasks are keyed by a day string `DD.MM.YYYY` and carry a 24-hour `HH:MM`
//! time of day; income configs and ledger records are partitioned by a month
//! key `YYYY-MM`. These formats come from the stored records, so parsing is
//! lenient: a malformed key simply yields `None` and the caller skips the row.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Format a date as a task day-key: `05.06.2025`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Format a date as a ledger month-key: `2025-06`.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Parse a `DD.MM.YYYY` day-key back to a date.
pub fn parse_day_key(day: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(day, "%d.%m.%Y").ok()
}

/// Parse a `HH:MM` time-of-day string.
pub fn parse_time(time: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(time, "%H:%M").ok()
}

/// Resolve a task's (day, time) pair to its due instant.
pub fn task_instant(day: &str, time: &str) -> Option<NaiveDateTime> {
    Some(parse_day_key(day)?.and_time(parse_time(time)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_key_round_trip() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap();
        assert_eq!(day_key(date), "05.06.2025");
        assert_eq!(parse_day_key("05.06.2025"), Some(date));
    }

    #[test]
    fn test_month_key() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap();
        assert_eq!(month_key(date), "2025-06");
    }

    #[test]
    fn test_task_instant() {
        let instant = task_instant("05.06.2025", "09:30").unwrap();
        assert_eq!(instant.format("%Y-%m-%d %H:%M").to_string(), "2025-06-05 09:30");
    }

    #[test]
    fn test_malformed_keys_yield_none() {
        assert!(parse_day_key("2025-06-05").is_none());
        assert!(parse_time("9am").is_none());
        assert!(task_instant("garbage", "09:00").is_none());
    }
}
