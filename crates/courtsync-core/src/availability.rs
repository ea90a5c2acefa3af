//! Availability payload parsing.
//!
//! This module turns one day's raw reservation payload into the canonical
//! [`Availability`] mapping:
//!
//! ```text
//! date → group → sub-resource → slot label → booked
//! ```
//!
//! The payload is decoded and classified at this boundary. Anything that is
//! not the recognized shape is rejected with a [`DataFormatError`] naming the
//! offending key, so no other component ever handles raw JSON.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DataFormatError;

/// Slot label → booked.
pub type SlotMap = BTreeMap<String, bool>;

/// Sub-resource → slots.
pub type GroupAvailability = BTreeMap<String, SlotMap>;

/// Group → sub-resources.
pub type DayAvailability = BTreeMap<String, GroupAvailability>;

/// What to assume when a resource has fewer slot details than the payload
/// has slot labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDetailPolicy {
    /// Treat the slot as free (fail-open).
    #[default]
    Free,
    /// Treat the slot as booked (fail-closed).
    Booked,
}

impl MissingDetailPolicy {
    fn booked(self) -> bool {
        matches!(self, Self::Booked)
    }
}

/// Rules for recognizing court resources inside a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseRules {
    /// Substring identifying a court-type resource name.
    pub marker: String,
    /// Replacement for the marker in the sub-resource half of the name.
    pub replacement: String,
    /// Separator between the group and sub-resource halves.
    pub separator: String,
    /// Status code that means "booked".
    pub booked_status: i64,
    /// Policy for slot details missing from a resource.
    pub missing_detail: MissingDetailPolicy,
}

impl Default for ParseRules {
    fn default() -> Self {
        Self {
            marker: "Tennis Court".to_string(),
            replacement: "Court".to_string(),
            separator: " - ".to_string(),
            booked_status: 1,
            missing_detail: MissingDetailPolicy::Free,
        }
    }
}

impl ParseRules {
    /// Builder method to set the missing-detail policy.
    pub fn with_missing_detail(mut self, policy: MissingDetailPolicy) -> Self {
        self.missing_detail = policy;
        self
    }

    /// Splits a resource name into `(group, sub-resource)`.
    ///
    /// Returns `None` for names that are not court resources.
    pub fn split_resource_name(&self, name: &str) -> Option<(String, String)> {
        if self.marker.is_empty() || !name.contains(&self.marker) {
            return None;
        }
        let (group, sub) = name.split_once(&self.separator)?;
        let group = group.trim();
        let sub = sub.trim().replace(&self.marker, &self.replacement);
        if group.is_empty() || sub.is_empty() {
            return None;
        }
        Some((group.to_string(), sub))
    }
}

/// Canonical availability for one or more days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    days: BTreeMap<NaiveDate, DayAvailability>,
}

impl Availability {
    /// Creates an empty availability.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the booked state of one slot.
    pub fn set_slot(
        &mut self,
        date: NaiveDate,
        group: impl Into<String>,
        sub_resource: impl Into<String>,
        slot: impl Into<String>,
        booked: bool,
    ) {
        self.days
            .entry(date)
            .or_default()
            .entry(group.into())
            .or_default()
            .entry(sub_resource.into())
            .or_default()
            .insert(slot.into(), booked);
    }

    /// Merges another availability into this one.
    ///
    /// Slots present in `other` overwrite the same slots here.
    pub fn merge(&mut self, other: Availability) {
        for (date, groups) in other.days {
            let day = self.days.entry(date).or_default();
            for (group, subs) in groups {
                let target = day.entry(group).or_default();
                for (sub, slots) in subs {
                    target.entry(sub).or_default().extend(slots);
                }
            }
        }
    }

    /// Returns the days in ascending order.
    pub fn days(&self) -> impl Iterator<Item = (&NaiveDate, &DayAvailability)> {
        self.days.iter()
    }

    /// Returns the availability of one day.
    pub fn day(&self, date: NaiveDate) -> Option<&DayAvailability> {
        self.days.get(&date)
    }

    /// Returns the booked state of one slot, if known.
    pub fn slot(&self, date: NaiveDate, group: &str, sub_resource: &str, slot: &str) -> Option<bool> {
        self.days
            .get(&date)?
            .get(group)?
            .get(sub_resource)?
            .get(slot)
            .copied()
    }

    /// Returns true if no day has any resource.
    pub fn is_empty(&self) -> bool {
        self.days.values().all(|groups| groups.is_empty())
    }

    /// Returns the number of days held.
    pub fn day_count(&self) -> usize {
        self.days.len()
    }
}

/// The fields of a payload in the recognized shape.
#[derive(Debug)]
struct RecognizedPayload<'a> {
    date: Option<&'a Value>,
    time_slots: &'a [Value],
    resources: &'a [Value],
}

/// A decoded payload, classified before any field is interpreted.
#[derive(Debug)]
enum PayloadShape<'a> {
    Recognized(RecognizedPayload<'a>),
    Unrecognized(DataFormatError),
}

impl<'a> PayloadShape<'a> {
    fn classify(root: &'a Value) -> Self {
        match Self::recognize(root) {
            Ok(payload) => Self::Recognized(payload),
            Err(err) => Self::Unrecognized(err),
        }
    }

    fn recognize(root: &'a Value) -> Result<RecognizedPayload<'a>, DataFormatError> {
        let body = root
            .get("body")
            .ok_or_else(|| DataFormatError::missing("body"))?;
        let availability = body
            .get("availability")
            .ok_or_else(|| DataFormatError::missing("availability"))?;
        let time_slots = list_field(availability, "time_slots")?;
        let resources = list_field(availability, "resources")?;

        Ok(RecognizedPayload {
            date: body.get("date").filter(|d| !d.is_null()),
            time_slots,
            resources,
        })
    }
}

/// Returns a required list field of `container`.
fn list_field<'a>(container: &'a Value, key: &'static str) -> Result<&'a [Value], DataFormatError> {
    match container.get(key) {
        None => Err(DataFormatError::missing(key)),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(DataFormatError::not_a_list(key)),
    }
}

/// Parses one day's raw payload into canonical availability.
///
/// `reference_date` is used when the payload carries no `body.date`.
///
/// # Errors
///
/// Returns [`DataFormatError`] when the bytes are not JSON, when a container
/// key is missing, when a list field is not a list, or when a slot label or
/// date cannot be interpreted.
pub fn parse(
    raw: &[u8],
    reference_date: NaiveDate,
    rules: &ParseRules,
) -> Result<Availability, DataFormatError> {
    let root: Value = serde_json::from_slice(raw)?;
    let payload = match PayloadShape::classify(&root) {
        PayloadShape::Recognized(payload) => payload,
        PayloadShape::Unrecognized(err) => return Err(err),
    };

    let date = match payload.date {
        Some(value) => parse_date(value)?,
        None => reference_date,
    };
    let slots = slot_labels(payload.time_slots)?;

    let mut availability = Availability::new();
    for resource in payload.resources {
        let Some(name) = resource.get("resource_name").and_then(Value::as_str) else {
            debug!("skipping resource without a name");
            continue;
        };
        let Some((group, sub_resource)) = rules.split_resource_name(name) else {
            debug!("skipping non-court resource '{}'", name);
            continue;
        };

        let details: &[Value] = match resource.get("time_slot_details") {
            None | Some(Value::Null) => &[],
            Some(Value::Array(items)) => items.as_slice(),
            Some(_) => return Err(DataFormatError::not_a_list("time_slot_details")),
        };
        if details.len() != slots.len() {
            warn!(
                "resource '{}' on {} has {} slot details for {} slots",
                name,
                date,
                details.len(),
                slots.len()
            );
        }

        for (index, slot) in slots.iter().enumerate() {
            let booked = match details.get(index) {
                Some(detail) => is_booked(detail, rules.booked_status),
                None => rules.missing_detail.booked(),
            };
            availability.set_slot(date, group.as_str(), sub_resource.as_str(), slot.as_str(), booked);
        }
    }

    debug!("parsed availability for {}", date);
    Ok(availability)
}

fn parse_date(value: &Value) -> Result<NaiveDate, DataFormatError> {
    let text = value
        .as_str()
        .ok_or_else(|| DataFormatError::invalid("date", value.to_string()))?;
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| DataFormatError::invalid("date", text))
}

/// Extracts `HH:MM` slot labels from entries like `"09:00-09:30"`.
fn slot_labels(time_slots: &[Value]) -> Result<Vec<String>, DataFormatError> {
    let mut labels = Vec::with_capacity(time_slots.len());
    for entry in time_slots {
        let text = entry
            .as_str()
            .ok_or_else(|| DataFormatError::invalid("time_slots", entry.to_string()))?;
        let start = text.split('-').next().unwrap_or_default().trim();
        let time = NaiveTime::parse_from_str(start, "%H:%M")
            .map_err(|_| DataFormatError::invalid("time_slots", text))?;
        let label = time.format("%H:%M").to_string();
        if labels.contains(&label) {
            return Err(DataFormatError::invalid(
                "time_slots",
                format!("duplicate slot {}", label),
            ));
        }
        labels.push(label);
    }
    Ok(labels)
}

fn is_booked(detail: &Value, booked_status: i64) -> bool {
    detail.get("status").and_then(Value::as_i64) == Some(booked_status)
}
