//! Half-open time intervals and calendar range computation.
//!
//! Appointments occupy half-open intervals `[start, end)`: an appointment
//! ending exactly when another starts does not overlap it. Calendar views
//! (day/week/month) use inclusive bounds with the end pinned to the last
//! millisecond of the final day, matching how range queries filter rows.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use vetbase_core::TimeRange;
//!
//! let first = TimeRange::new(
//!     Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap(),
//! )
//! .unwrap();
//! let second = TimeRange::new(
//!     Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap(),
//! )
//! .unwrap();
//!
//! // Touching endpoints are not a conflict.
//! assert!(!first.overlaps(&second));
//! ```

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when constructing a [`TimeRange`] with `end <= start`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("time range end ({end}) must be after start ({start})")]
pub struct InvalidTimeRange {
    /// The rejected start instant.
    pub start: DateTime<Utc>,
    /// The rejected end instant.
    pub end: DateTime<Utc>,
}

/// A half-open time interval `[start, end)` with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range, rejecting empty or inverted intervals.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidTimeRange> {
        if end <= start {
            return Err(InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Start of the interval (inclusive).
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the interval (exclusive).
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the interval.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Half-open overlap test: `[a, b)` and `[c, d)` overlap iff `a < d && c < b`.
    ///
    /// Touching endpoints (`b == c`) do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether an instant falls inside the interval.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Number of calendar days the interval touches, inclusive of both ends.
    #[must_use]
    pub fn days_spanned(&self) -> i64 {
        (self.end.date_naive() - self.start.date_naive()).num_days() + 1
    }
}

/// Inclusive bounds for a single UTC day: midnight through 23:59:59.999.
#[must_use]
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_hms_opt(0, 0, 0).expect("midnight is valid").and_utc();
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .expect("last millisecond is valid")
        .and_utc();
    (start, end)
}

/// Inclusive bounds for the ISO week (Monday through Sunday) containing `date`.
#[must_use]
pub fn week_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_from_monday = i64::from(date.weekday().num_days_from_monday());
    let monday = date - Duration::days(days_from_monday);
    let sunday = monday + Duration::days(6);
    (day_bounds(monday).0, day_bounds(sunday).1)
}

/// Inclusive bounds for the calendar month containing `date`.
#[must_use]
pub fn month_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .expect("first of month is valid");
    let first_of_next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
    .expect("first of next month is valid");
    let last = first_of_next - Duration::days(1);
    (day_bounds(first).0, day_bounds(last).1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn test_rejects_inverted_interval() {
        assert!(TimeRange::new(ts(10, 0), ts(9, 0)).is_err());
        assert!(TimeRange::new(ts(9, 0), ts(9, 0)).is_err());
    }

    #[test]
    fn test_overlap_when_intervals_intersect() {
        let a = TimeRange::new(ts(9, 0), ts(9, 30)).unwrap();
        let b = TimeRange::new(ts(9, 15), ts(9, 45)).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_touching_endpoints_do_not_overlap() {
        let a = TimeRange::new(ts(9, 0), ts(9, 30)).unwrap();
        let b = TimeRange::new(ts(9, 30), ts(10, 0)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_containment_counts_as_overlap() {
        let outer = TimeRange::new(ts(9, 0), ts(11, 0)).unwrap();
        let inner = TimeRange::new(ts(9, 30), ts(10, 0)).unwrap();
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_contains_is_half_open() {
        let range = TimeRange::new(ts(9, 0), ts(10, 0)).unwrap();
        assert!(range.contains(ts(9, 0)));
        assert!(range.contains(ts(9, 59)));
        assert!(!range.contains(ts(10, 0)));
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let (start, end) = day_bounds(date);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap());
        assert_eq!(end.date_naive(), date);
        assert_eq!(end.format("%H:%M:%S%.3f").to_string(), "23:59:59.999");
    }

    #[test]
    fn test_week_bounds_start_on_monday() {
        // 2025-03-12 is a Wednesday; its ISO week is Mar 10 (Mon) .. Mar 16 (Sun).
        let date = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let (start, end) = week_bounds(date);
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 16).unwrap());
    }

    #[test]
    fn test_week_bounds_on_monday_and_sunday() {
        let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let (start, _) = week_bounds(monday);
        assert_eq!(start.date_naive(), monday);

        let sunday = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
        let (start, end) = week_bounds(sunday);
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(end.date_naive(), sunday);
    }

    #[test]
    fn test_month_bounds_regular_and_december() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 17).unwrap();
        let (start, end) = month_bounds(date);
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());

        let december = NaiveDate::from_ymd_opt(2025, 12, 25).unwrap();
        let (_, end) = month_bounds(december);
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_month_bounds_leap_february() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        let (_, end) = month_bounds(date);
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_days_spanned_inclusive() {
        let (start, end) = day_bounds(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        let range = TimeRange::new(start, end).unwrap();
        assert_eq!(range.days_spanned(), 1);

        let (start, end) = week_bounds(NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
        let range = TimeRange::new(start, end).unwrap();
        assert_eq!(range.days_spanned(), 7);
    }
}
