//! Desired-vs-existing event diffing.
//!
//! Events are compared by their [`IdentityTriple`] (title, rendered start,
//! rendered end), never by id. Comparison is exact string equality of the
//! rendered timestamps: two renderings of one instant with different offset
//! notation are different identities and show up as a create plus a delete.

use std::collections::{BTreeMap, HashSet};

use crate::consolidate::Interval;
use crate::event::{CalendarEvent, IdentityTriple, NewEvent};

/// The create/delete instructions that make a calendar match desired state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDiff {
    /// Events to create, in desired iteration order.
    pub to_create: Vec<NewEvent>,
    /// Ids of existing events to delete, in existing order.
    pub to_delete: Vec<String>,
    /// Number of existing events that already match desired state.
    pub unchanged: usize,
}

impl EventDiff {
    /// Returns true if there is nothing to create or delete.
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_delete.is_empty()
    }
}

/// Computes the events to create and delete for one calendar.
///
/// `desired` maps sub-resource names (the event titles) to their intervals.
pub fn diff(desired: &BTreeMap<String, Vec<Interval>>, existing: &[CalendarEvent]) -> EventDiff {
    let existing_ids: HashSet<IdentityTriple> = existing.iter().map(CalendarEvent::identity).collect();

    let mut desired_ids = HashSet::new();
    let mut to_create = Vec::new();
    for (title, intervals) in desired {
        for interval in intervals {
            let identity = IdentityTriple::new(title, interval.start_text(), interval.end_text());
            if !desired_ids.insert(identity.clone()) {
                continue;
            }
            if !existing_ids.contains(&identity) {
                to_create.push(NewEvent::new(title, interval.start_fixed(), interval.end_fixed()));
            }
        }
    }

    let mut to_delete = Vec::new();
    let mut unchanged = 0;
    for event in existing {
        if desired_ids.contains(&event.identity()) {
            unchanged += 1;
        } else {
            to_delete.push(event.id.clone());
        }
    }

    EventDiff {
        to_create,
        to_delete,
        unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use chrono_tz::America::Los_Angeles;
    use chrono_tz::Tz;

    fn la(h: u32, m: u32) -> DateTime<Tz> {
        Los_Angeles.with_ymd_and_hms(2025, 4, 20, h, m, 0).unwrap()
    }

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn existing(id: &str, title: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent::new(id, title, at(start), at(end))
    }

    fn desired(entries: &[(&str, (u32, u32), (u32, u32))]) -> BTreeMap<String, Vec<Interval>> {
        let mut map: BTreeMap<String, Vec<Interval>> = BTreeMap::new();
        for (title, (sh, sm), (eh, em)) in entries {
            map.entry(title.to_string())
                .or_default()
                .push(Interval::new(la(*sh, *sm), la(*eh, *em)));
        }
        map
    }

    #[test]
    fn matching_state_is_idempotent() {
        let desired = desired(&[("Court 1", (9, 0), (10, 0)), ("Court 2", (10, 0), (11, 0))]);
        let existing = vec![
            existing("a", "Court 1", "2025-04-20T09:00:00-07:00", "2025-04-20T10:00:00-07:00"),
            existing("b", "Court 2", "2025-04-20T10:00:00-07:00", "2025-04-20T11:00:00-07:00"),
        ];

        let result = diff(&desired, &existing);
        assert!(result.is_empty());
        assert_eq!(result.unchanged, 2);
    }

    #[test]
    fn extra_existing_event_is_deleted() {
        let desired = desired(&[("Court 1", (9, 0), (10, 0))]);
        let existing = vec![
            existing("a", "Court 1", "2025-04-20T09:00:00-07:00", "2025-04-20T10:00:00-07:00"),
            existing("c", "Court 3", "2025-04-20T12:00:00-07:00", "2025-04-20T13:00:00-07:00"),
        ];

        let result = diff(&desired, &existing);
        assert!(result.to_create.is_empty());
        assert_eq!(result.to_delete, vec!["c".to_string()]);
    }

    #[test]
    fn missing_event_is_created() {
        let desired = desired(&[("Court 1", (9, 0), (10, 0)), ("Court 4", (18, 30), (19, 0))]);
        let existing = vec![existing(
            "a",
            "Court 1",
            "2025-04-20T09:00:00-07:00",
            "2025-04-20T10:00:00-07:00",
        )];

        let result = diff(&desired, &existing);
        assert!(result.to_delete.is_empty());
        assert_eq!(
            result.to_create,
            vec![NewEvent::new(
                "Court 4",
                at("2025-04-20T18:30:00-07:00"),
                at("2025-04-20T19:00:00-07:00")
            )]
        );
        insta::assert_snapshot!(
            result.to_create[0].identity().to_string(),
            @"Court 4 [2025-04-20T18:30:00-07:00 - 2025-04-20T19:00:00-07:00)"
        );
    }

    #[test]
    fn changed_interval_is_replaced() {
        let desired = desired(&[("Court 1", (9, 0), (11, 0))]);
        let existing = vec![existing(
            "a",
            "Court 1",
            "2025-04-20T09:00:00-07:00",
            "2025-04-20T10:00:00-07:00",
        )];

        let result = diff(&desired, &existing);
        assert_eq!(result.to_create.len(), 1);
        assert_eq!(result.to_delete, vec!["a".to_string()]);
    }

    #[test]
    fn offset_notation_skew_is_not_corrected() {
        let desired = desired(&[("Court 1", (9, 0), (10, 0))]);
        let existing = vec![existing("a", "Court 1", "2025-04-20T16:00:00Z", "2025-04-20T17:00:00Z")];

        let result = diff(&desired, &existing);
        assert_eq!(result.to_create.len(), 1);
        assert_eq!(result.to_delete, vec!["a".to_string()]);
    }

    #[test]
    fn duplicate_existing_events_are_kept() {
        let desired = desired(&[("Court 1", (9, 0), (10, 0))]);
        let existing = vec![
            existing("a", "Court 1", "2025-04-20T09:00:00-07:00", "2025-04-20T10:00:00-07:00"),
            existing("b", "Court 1", "2025-04-20T09:00:00-07:00", "2025-04-20T10:00:00-07:00"),
        ];

        let result = diff(&desired, &existing);
        assert!(result.is_empty());
        assert_eq!(result.unchanged, 2);
    }

    #[test]
    fn empty_desired_deletes_everything() {
        let existing = vec![
            existing("a", "Court 1", "2025-04-20T09:00:00-07:00", "2025-04-20T10:00:00-07:00"),
            existing("b", "Court 2", "2025-04-20T09:00:00-07:00", "2025-04-20T10:00:00-07:00"),
        ];

        let result = diff(&BTreeMap::new(), &existing);
        assert!(result.to_create.is_empty());
        assert_eq!(result.to_delete, vec!["a".to_string(), "b".to_string()]);
    }
}
