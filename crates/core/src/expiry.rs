//! Expiry window calculation and milestone bucketing.
//!
//! Two reminder jobs share this module:
//!
//! - The short-horizon job looks for documents expiring within the next
//!   three days ([`short_horizon_window`]). Matching is pushed down to the
//!   repository query, so no in-memory classification is needed there.
//! - The monthly-milestone job classifies each document against the 1/2/3
//!   calendar-month anniversaries of its report date ([`classify`]), with a
//!   symmetric ±3 day tolerance around each target.
//!
//! Everything here is pure and deterministic: the same `(today, record)`
//! inputs always produce the same buckets.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Length of the short-horizon lookahead, in days (inclusive).
pub const SHORT_HORIZON_DAYS: i64 = 3;

/// Symmetric tolerance around each milestone target, in days.
pub const MILESTONE_TOLERANCE_DAYS: i64 = 3;

/// Milestone distances tested, in descending order.
///
/// Descending order is the tie-break: a record within tolerance of two
/// targets (possible around very short months) lands in the larger bucket.
const MILESTONE_MONTHS: [u32; 3] = [3, 2, 1];

// ---------------------------------------------------------------------------
// ExpiryWindow
// ---------------------------------------------------------------------------

/// An inclusive calendar-date range `[start, end]`.
///
/// Windows are derived from "today" at invocation time and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ExpiryWindow {
    /// Whether `date` falls inside the window (inclusive on both ends).
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Window for the short-horizon job: `[today, today + 3 days]`.
pub fn short_horizon_window(today: NaiveDate) -> ExpiryWindow {
    ExpiryWindow {
        start: today,
        end: today + Duration::days(SHORT_HORIZON_DAYS),
    }
}

/// Coarse outer bound for the monthly job's repository query:
/// `[today, today + 3 calendar months]`.
///
/// This only narrows the initial query; the per-record bucketing in
/// [`classify`] is what decides whether a reminder actually fires.
pub fn monthly_outer_window(today: NaiveDate) -> ExpiryWindow {
    let end = add_calendar_months(today, 3)
        .unwrap_or_else(|| today + Duration::days(3 * 31));
    ExpiryWindow { start: today, end }
}

// ---------------------------------------------------------------------------
// Calendar-month arithmetic
// ---------------------------------------------------------------------------

/// Add `months` to the month field of `date`, spilling overflow days into
/// the following month.
///
/// This mirrors "set month = month + N" semantics: `2024-01-31 + 1 month`
/// is `2024-03-02` (Jan 31 -> Feb "31" -> spills 2 days past Feb 29), not a
/// clamped `2024-02-29`.
///
/// Returns `None` only when the result falls outside chrono's representable
/// date range.
pub fn add_calendar_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let total = date.month0() + months;
    let year = date.year() + (total / 12) as i32;
    let month = total % 12 + 1;

    match NaiveDate::from_ymd_opt(year, month, date.day()) {
        Some(d) => Some(d),
        None => {
            // Day-of-month overflows the target month; count the excess
            // days forward from the first of that month.
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            first.checked_add_signed(Duration::days(i64::from(date.day()) - 1))
        }
    }
}

/// The milestone target date `report_date + N calendar months`.
pub fn milestone_target(report_date: NaiveDate, months: u32) -> Option<NaiveDate> {
    add_calendar_months(report_date, months)
}

/// Whole days from `today` until `expire` (negative when already expired).
pub fn days_until(today: NaiveDate, expire: NaiveDate) -> i64 {
    (expire - today).num_days()
}

// ---------------------------------------------------------------------------
// Milestone buckets
// ---------------------------------------------------------------------------

/// The month-distance category a document falls into for the monthly job.
///
/// `Other` is informational only; it never triggers a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneBucket {
    ThreeMonths,
    TwoMonths,
    OneMonth,
    Other,
}

impl MilestoneBucket {
    /// The month distance this bucket represents, if it is a notifiable one.
    pub fn months(self) -> Option<u32> {
        match self {
            MilestoneBucket::ThreeMonths => Some(3),
            MilestoneBucket::TwoMonths => Some(2),
            MilestoneBucket::OneMonth => Some(1),
            MilestoneBucket::Other => None,
        }
    }

    fn from_months(months: u32) -> Self {
        match months {
            3 => MilestoneBucket::ThreeMonths,
            2 => MilestoneBucket::TwoMonths,
            _ => MilestoneBucket::OneMonth,
        }
    }
}

/// Classify a document into exactly one milestone bucket.
///
/// Targets are tested in descending order (3 months, then 2, then 1); the
/// record lands in the first bucket whose target date is within
/// [`MILESTONE_TOLERANCE_DAYS`] of its expiry date. A missing report date
/// means no milestone basis exists, so the record classifies as
/// [`MilestoneBucket::Other`] rather than erroring.
pub fn classify(report_date: Option<NaiveDate>, expire_date: NaiveDate) -> MilestoneBucket {
    let Some(report) = report_date else {
        return MilestoneBucket::Other;
    };

    for months in MILESTONE_MONTHS {
        if let Some(target) = milestone_target(report, months) {
            if (expire_date - target).num_days().abs() <= MILESTONE_TOLERANCE_DAYS {
                return MilestoneBucket::from_months(months);
            }
        }
    }

    MilestoneBucket::Other
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // -- short-horizon window --

    #[test]
    fn short_horizon_window_is_today_plus_three_days() {
        let w = short_horizon_window(d(2024, 1, 15));
        assert_eq!(w.start, d(2024, 1, 15));
        assert_eq!(w.end, d(2024, 1, 18));
    }

    #[test]
    fn short_horizon_window_bounds_are_inclusive() {
        let w = short_horizon_window(d(2024, 1, 15));
        assert!(w.contains(d(2024, 1, 15)));
        assert!(w.contains(d(2024, 1, 17)));
        assert!(w.contains(d(2024, 1, 18)));
        assert!(!w.contains(d(2024, 1, 19)));
        assert!(!w.contains(d(2024, 1, 14)));
    }

    // -- calendar-month addition --

    #[test]
    fn month_addition_plain() {
        assert_eq!(add_calendar_months(d(2024, 1, 1), 3), Some(d(2024, 4, 1)));
        assert_eq!(add_calendar_months(d(2024, 11, 15), 2), Some(d(2025, 1, 15)));
    }

    #[test]
    fn month_addition_spills_past_short_months() {
        // Jan 31 + 1 month: Feb has 29 days in 2024, so 2 days spill into March.
        assert_eq!(add_calendar_months(d(2024, 1, 31), 1), Some(d(2024, 3, 2)));
        // Non-leap year: 3 days spill.
        assert_eq!(add_calendar_months(d(2023, 1, 31), 1), Some(d(2023, 3, 3)));
        assert_eq!(add_calendar_months(d(2024, 3, 31), 1), Some(d(2024, 5, 1)));
    }

    #[test]
    fn monthly_outer_window_spans_three_months() {
        let w = monthly_outer_window(d(2024, 1, 15));
        assert_eq!(w.start, d(2024, 1, 15));
        assert_eq!(w.end, d(2024, 4, 15));
    }

    // -- classification --

    #[test]
    fn classifies_three_month_milestone_within_tolerance() {
        // Target for 3 months is 2024-04-01; tolerance window [03-29, 04-04].
        let bucket = classify(Some(d(2024, 1, 1)), d(2024, 4, 2));
        assert_eq!(bucket, MilestoneBucket::ThreeMonths);
    }

    #[test]
    fn classifies_each_milestone() {
        let report = Some(d(2024, 1, 1));
        assert_eq!(classify(report, d(2024, 2, 1)), MilestoneBucket::OneMonth);
        assert_eq!(classify(report, d(2024, 3, 3)), MilestoneBucket::TwoMonths);
        assert_eq!(classify(report, d(2024, 3, 29)), MilestoneBucket::ThreeMonths);
    }

    #[test]
    fn outside_all_tolerances_is_other() {
        let report = Some(d(2024, 1, 1));
        assert_eq!(classify(report, d(2024, 2, 10)), MilestoneBucket::Other);
        assert_eq!(classify(report, d(2025, 1, 1)), MilestoneBucket::Other);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let report = Some(d(2024, 1, 1));
        // 3-month target 2024-04-01, +3 days.
        assert_eq!(classify(report, d(2024, 4, 4)), MilestoneBucket::ThreeMonths);
        assert_eq!(classify(report, d(2024, 4, 5)), MilestoneBucket::Other);
        // -3 days overlaps the 2-month side? 03-29 is 3 days before 04-01 and
        // 27 days after 03-01, so it belongs to ThreeMonths only.
        assert_eq!(classify(report, d(2024, 3, 29)), MilestoneBucket::ThreeMonths);
    }

    #[test]
    fn descending_order_wins_on_overlap() {
        // Dec 31 report: target2 = Mar 2 (spill), target3 = Mar 31.
        // Pick an expiry near target2 and confirm it does not get absorbed
        // by a larger bucket unless genuinely within its tolerance.
        let report = Some(d(2023, 12, 31));
        assert_eq!(classify(report, d(2024, 3, 2)), MilestoneBucket::TwoMonths);
        assert_eq!(classify(report, d(2024, 3, 31)), MilestoneBucket::ThreeMonths);
    }

    #[test]
    fn missing_report_date_is_other_and_never_panics() {
        assert_eq!(classify(None, d(2024, 4, 2)), MilestoneBucket::Other);
    }

    #[test]
    fn classification_is_idempotent() {
        let report = Some(d(2024, 1, 1));
        let expire = d(2024, 4, 2);
        let first = classify(report, expire);
        let second = classify(report, expire);
        assert_eq!(first, second);
    }

    #[test]
    fn record_lands_in_exactly_one_bucket() {
        let report = Some(d(2024, 1, 1));
        let expire = d(2024, 4, 2);
        let matched: Vec<MilestoneBucket> = MILESTONE_MONTHS
            .iter()
            .filter_map(|&m| {
                let target = milestone_target(d(2024, 1, 1), m).unwrap();
                ((expire - target).num_days().abs() <= MILESTONE_TOLERANCE_DAYS)
                    .then(|| MilestoneBucket::from_months(m))
            })
            .collect();
        assert_eq!(matched, vec![MilestoneBucket::ThreeMonths]);
        assert_eq!(classify(report, expire), MilestoneBucket::ThreeMonths);
    }

    // -- days_until --

    #[test]
    fn days_until_counts_calendar_days() {
        assert_eq!(days_until(d(2024, 1, 15), d(2024, 1, 17)), 2);
        assert_eq!(days_until(d(2024, 1, 15), d(2024, 1, 15)), 0);
        assert_eq!(days_until(d(2024, 1, 15), d(2024, 1, 14)), -1);
    }
}
