//! Calendar view ranges and bookable-slot capacity.
//!
//! A view names a granularity (day, week, month) and resolves to an
//! inclusive UTC range. Capacity only exists for a single collaborator:
//! each configured shift contributes a fixed number of slots per day, and
//! the total scales by the days the range spans. Without a collaborator the
//! summary is just a booked count with no ceiling.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use vetbase_core::{day_bounds, month_bounds, week_bounds, TimeRange};

/// Slots contributed per day by each known shift name.
const SHIFT_SLOTS: &[(&str, i64)] = &[
    ("morning", 4),
    ("afternoon", 4),
    ("evening", 2),
    ("full_day", 8),
];

/// Slots assumed for a shift name the table does not know.
///
/// Inherited business policy; worth confirming with the domain owners
/// rather than silently relying on it.
const DEFAULT_SHIFT_SLOTS: i64 = 2;

/// Granularity of a calendar query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    /// A single day.
    Day,
    /// The ISO week (Monday through Sunday) containing the reference date.
    Week,
    /// The calendar month containing the reference date.
    Month,
}

/// Capacity numbers for a range. `total_slots`/`available_slots` are `None`
/// when no collaborator was named (a bare booked count has no ceiling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacitySummary {
    /// Bookable slots in the range, when a collaborator was named.
    pub total_slots: Option<i64>,
    /// Non-completed appointments in the range.
    pub booked_slots: i64,
    /// `max(total - booked, 0)`, when a collaborator was named.
    pub available_slots: Option<i64>,
}

/// A resolved calendar query: the range plus its capacity.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarSummary {
    /// Requested granularity.
    pub view: CalendarView,
    /// Range start (inclusive).
    pub start: DateTime<Utc>,
    /// Range end (inclusive, last millisecond of the final day).
    pub end: DateTime<Utc>,
    /// Capacity numbers.
    #[serde(flatten)]
    pub capacity: CapacitySummary,
}

/// Resolve a view and reference date to its inclusive UTC range.
#[must_use]
pub fn view_range(view: CalendarView, reference: NaiveDate) -> TimeRange {
    let (start, end) = match view {
        CalendarView::Day => day_bounds(reference),
        CalendarView::Week => week_bounds(reference),
        CalendarView::Month => month_bounds(reference),
    };
    TimeRange::new(start, end).expect("calendar bounds are ordered")
}

/// Slots per day contributed by a collaborator's configured shifts.
///
/// Unknown shift names fall back to the baseline and are logged so the
/// misconfiguration is visible.
#[must_use]
pub fn slots_per_day(shifts: &[String]) -> i64 {
    shifts
        .iter()
        .map(|shift| {
            SHIFT_SLOTS
                .iter()
                .find(|(name, _)| name == shift)
                .map_or_else(
                    || {
                        tracing::warn!(shift, "Unrecognized shift name; assuming baseline slots");
                        DEFAULT_SHIFT_SLOTS
                    },
                    |(_, slots)| *slots,
                )
        })
        .sum()
}

/// Combine a slot ceiling with a booked count. Availability never goes
/// negative even when a collaborator is overbooked.
#[must_use]
pub fn capacity_summary(total_slots: Option<i64>, booked_slots: i64) -> CapacitySummary {
    CapacitySummary {
        total_slots,
        booked_slots,
        available_slots: total_slots.map(|total| (total - booked_slots).max(0)),
    }
}
