//! crates/timekeeper_core/src/clock.rs
//!
//! `Clock` implementations and the calendar helpers built on top of them.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use std::sync::Mutex;

use crate::ports::Clock;

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used by tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

//=========================================================================================
// Calendar Helpers
//=========================================================================================

/// Monday of the week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    date - Duration::days(days)
}

/// First instant of `date`.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Last whole second of `date`.
pub fn day_end(date: NaiveDate) -> DateTime<Utc> {
    day_start(date) + Duration::seconds(86_399)
}

/// Whole minutes from `start` to `end`, truncated, never negative.
pub fn whole_minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_minutes().max(0)
}

/// Whole seconds from `start` to `end`, truncated, never negative.
pub fn whole_seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().max(0)
}

/// Minutes as hours rounded to two decimals.
pub fn minutes_to_hours(minutes: i64) -> f64 {
    (minutes as f64 / 60.0 * 100.0).round() / 100.0
}

/// Renders a duration the way clients display it, e.g. `"2 hours 5 minutes"`.
pub fn format_duration(minutes: i64) -> String {
    format!("{} hours {} minutes", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_starts_on_monday() {
        // 2026-10-18 is a Sunday.
        assert_eq!(start_of_week(date(2026, 10, 18)), date(2026, 10, 12));
        assert_eq!(start_of_week(date(2026, 10, 12)), date(2026, 10, 12));
        assert_eq!(start_of_week(date(2026, 10, 14)), date(2026, 10, 12));
    }

    #[test]
    fn month_start() {
        assert_eq!(start_of_month(date(2026, 2, 28)), date(2026, 2, 1));
    }

    #[test]
    fn minutes_are_truncated_and_clamped() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        assert_eq!(whole_minutes_between(start, start + Duration::seconds(119)), 1);
        assert_eq!(whole_minutes_between(start, start + Duration::seconds(59)), 0);
        assert_eq!(whole_minutes_between(start, start - Duration::seconds(30)), 0);
    }

    #[test]
    fn hours_round_to_two_decimals() {
        assert_eq!(minutes_to_hours(90), 1.5);
        assert_eq!(minutes_to_hours(100), 1.67);
        assert_eq!(format_duration(125), "2 hours 5 minutes");
    }

    #[test]
    fn manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), start + Duration::minutes(5));
        assert_eq!(day_end(date(2026, 1, 1)) - day_start(date(2026, 1, 1)), Duration::seconds(86_399));
    }
}
