//! Utility functions for the capacity_forecast crate

use chrono::NaiveDate;

/// Tolerance used when snapping a fractional day count to a whole day
const DAY_SNAP_TOLERANCE: f64 = 1e-6;

/// Whole days from `start` to `date` (negative when `date` is earlier)
pub fn day_offset(start: NaiveDate, date: NaiveDate) -> i64 {
    (date - start).num_days()
}

/// Truncate a fractional day count towards zero
///
/// Values within a tiny tolerance of a whole number snap to it, so a
/// crossing computed as `19.9999999` counts as 20 days rather than 19.
pub fn truncate_days(days: f64) -> i64 {
    let nearest = days.round();
    if (days - nearest).abs() < DAY_SNAP_TOLERANCE {
        nearest as i64
    } else {
        days.trunc() as i64
    }
}

/// Symmetric relative band around a day count, truncated to whole days
pub fn interval_band(days: Option<i64>, band: f64) -> (Option<i64>, Option<i64>) {
    match days {
        Some(d) => {
            let d = d as f64;
            (
                Some((d * (1.0 - band)).trunc() as i64),
                Some((d * (1.0 + band)).trunc() as i64),
            )
        }
        None => (None, None),
    }
}
