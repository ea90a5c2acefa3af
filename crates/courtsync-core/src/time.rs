//! Time helpers for the sync window and slot arithmetic.
//!
//! This module provides [`TimeWindow`] for calendar queries, the fixed
//! [`slot_duration`] of a bookable slot, and helpers to turn local dates and
//! times into timezone-aware instants.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Length of one bookable slot, in minutes.
pub const SLOT_MINUTES: i64 = 30;

/// Returns the length of one bookable slot.
pub fn slot_duration() -> Duration {
    Duration::minutes(SLOT_MINUTES)
}

/// Resolves a local date and time of day to an instant in `tz`.
///
/// Ambiguous local times (when clocks fall back) resolve to the earlier
/// instant, so the repeated hour is only ever seen once: slots 01:30 and
/// 02:00 on a fall-back day are an hour apart and do not merge. Returns
/// `None` for local times skipped by a DST transition.
pub fn local_instant<Tz: TimeZone>(date: NaiveDate, time: NaiveTime, tz: &Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&date.and_time(time)).earliest()
}

/// Returns `count` consecutive dates starting `offset_days` after `today`.
pub fn sync_dates(today: NaiveDate, offset_days: u32, count: u32) -> Vec<NaiveDate> {
    let first = today + Duration::days(i64::from(offset_days));
    first.iter_days().take(count as usize).collect()
}

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates the window covering whole local days `first..=last` in `tz`:
    /// from midnight of `first` up to midnight of the day after `last`.
    ///
    /// Returns `None` if `last` is before `first` or a boundary midnight does
    /// not exist in `tz`.
    pub fn for_dates<Tz: TimeZone>(first: NaiveDate, last: NaiveDate, tz: &Tz) -> Option<Self> {
        if last < first {
            return None;
        }
        let midnight = NaiveTime::from_hms_opt(0, 0, 0)?;
        let start = local_instant(first, midnight, tz)?;
        let end = local_instant(last.succ_opt()?, midnight, tz)?;
        Some(Self {
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
        })
    }

}
