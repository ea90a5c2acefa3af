//! Interval consolidation.
//!
//! Booked slots are merged into the smallest set of contiguous intervals per
//! sub-resource. For every `(date, group, sub-resource)` the booked slot
//! labels are scanned in order; a slot starting exactly where the running
//! interval ends extends it, anything else flushes it and starts a new one.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::availability::{Availability, SlotMap};
use crate::error::ConsolidateError;
use crate::event::render_instant;
use crate::time::{local_instant, slot_duration};

/// A half-open busy interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl Interval {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self { start, end }
    }

    /// Start instant with its numeric offset.
    pub fn start_fixed(&self) -> DateTime<FixedOffset> {
        self.start.fixed_offset()
    }

    /// End instant with its numeric offset.
    pub fn end_fixed(&self) -> DateTime<FixedOffset> {
        self.end.fixed_offset()
    }

    /// Rendered start, as used for identity comparison.
    pub fn start_text(&self) -> String {
        render_instant(&self.start)
    }

    /// Rendered end, as used for identity comparison.
    pub fn end_text(&self) -> String {
        render_instant(&self.end)
    }
}

/// Sub-resource → ordered intervals.
pub type GroupIntervals = BTreeMap<String, Vec<Interval>>;

/// Group → sub-resource → ordered intervals.
///
/// Sub-resources without bookings are absent rather than empty, and so are
/// groups without any booked sub-resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    groups: BTreeMap<String, GroupIntervals>,
}

impl DesiredState {
    /// Returns the intervals of one group, if it has any.
    pub fn group(&self, name: &str) -> Option<&GroupIntervals> {
        self.groups.get(name)
    }

    /// Returns all groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = (&String, &GroupIntervals)> {
        self.groups.iter()
    }

    /// Returns true if nothing is booked.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the total number of intervals across all groups.
    pub fn interval_count(&self) -> usize {
        self.groups
            .values()
            .flat_map(|subs| subs.values())
            .map(Vec::len)
            .sum()
    }

    fn extend(&mut self, group: &str, sub_resource: &str, intervals: Vec<Interval>) {
        if intervals.is_empty() {
            return;
        }
        self.groups
            .entry(group.to_string())
            .or_default()
            .entry(sub_resource.to_string())
            .or_default()
            .extend(intervals);
    }
}

/// Merges booked slots into contiguous intervals in `tz`.
///
/// Days are processed in ascending order, so each sub-resource's intervals
/// come out chronologically ordered, non-overlapping and non-adjacent within
/// a day.
///
/// # Errors
///
/// Returns [`ConsolidateError`] for a slot label that is not `HH:MM` or a
/// local time that does not exist in `tz`.
pub fn consolidate(availability: &Availability, tz: Tz) -> Result<DesiredState, ConsolidateError> {
    let mut desired = DesiredState::default();

    for (date, groups) in availability.days() {
        for (group, subs) in groups {
            for (sub_resource, slots) in subs {
                let intervals = merge_slots(*date, sub_resource, slots, tz)?;
                desired.extend(group, sub_resource, intervals);
            }
        }
    }

    Ok(desired)
}

/// Single left-to-right scan over one sub-resource's slots on one day.
fn merge_slots(
    date: NaiveDate,
    sub_resource: &str,
    slots: &SlotMap,
    tz: Tz,
) -> Result<Vec<Interval>, ConsolidateError> {
    let mut intervals = Vec::new();
    let mut current: Option<Interval> = None;

    // SlotMap iterates labels in lexicographic order, which is chronological
    // for zero-padded HH:MM.
    for (label, _) in slots.iter().filter(|(_, booked)| **booked) {
        let start = slot_start(date, sub_resource, label, tz)?;
        let end = start + slot_duration();

        current = match current {
            Some(running) if running.end == start => Some(Interval::new(running.start, end)),
            Some(running) => {
                intervals.push(running);
                Some(Interval::new(start, end))
            }
            None => Some(Interval::new(start, end)),
        };
    }

    if let Some(running) = current {
        intervals.push(running);
    }
    Ok(intervals)
}

fn slot_start(
    date: NaiveDate,
    sub_resource: &str,
    label: &str,
    tz: Tz,
) -> Result<DateTime<Tz>, ConsolidateError> {
    let time = NaiveTime::parse_from_str(label, "%H:%M").map_err(|_| {
        ConsolidateError::InvalidSlot {
            date,
            resource: sub_resource.to_string(),
            slot: label.to_string(),
        }
    })?;
    local_instant(date, time, &tz).ok_or_else(|| ConsolidateError::NonexistentLocalTime {
        date,
        slot: label.to_string(),
        timezone: tz.name().to_string(),
    })
}
