//! Calendar event types shared by the differ and the calendar backends.
//!
//! The engine never looks at event ids when deciding whether two events are
//! the same: it compares the [`IdentityTriple`] of title and rendered
//! start/end timestamps. The id is only carried so a delete can be issued.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};

/// Renders an instant in the canonical text form used for identity
/// comparison: RFC 3339, whole seconds, numeric offset.
///
/// Both sides of a diff must go through this function; `Z` and `+00:00`
/// name the same instant but compare unequal as text.
pub fn render_instant<Tz: TimeZone>(instant: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// An event as it currently exists in a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Opaque identifier owned by the calendar backend.
    pub id: String,
    /// Event title (the sub-resource name for synced events).
    pub title: String,
    /// Start instant.
    pub start: DateTime<FixedOffset>,
    /// End instant (exclusive).
    pub end: DateTime<FixedOffset>,
}

impl CalendarEvent {
    /// Creates a new calendar event.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start,
            end,
        }
    }

    /// Returns the identity triple used for diffing.
    pub fn identity(&self) -> IdentityTriple {
        IdentityTriple::new(&self.title, render_instant(&self.start), render_instant(&self.end))
    }
}

/// An event the sync wants to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Event title.
    pub title: String,
    /// Start instant.
    pub start: DateTime<FixedOffset>,
    /// End instant (exclusive).
    pub end: DateTime<FixedOffset>,
}

impl NewEvent {
    /// Creates a new event request.
    pub fn new(
        title: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            title: title.into(),
            start,
            end,
        }
    }

    /// Returns the identity triple this event will have once created.
    pub fn identity(&self) -> IdentityTriple {
        IdentityTriple::new(&self.title, render_instant(&self.start), render_instant(&self.end))
    }
}

/// The `(title, start, end)` equality key of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityTriple {
    pub title: String,
    pub start: String,
    pub end: String,
}

impl IdentityTriple {
    pub fn new(title: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start: start.into(),
            end: end.into(),
        }
    }
}

impl std::fmt::Display for IdentityTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{} - {})", self.title, self.start, self.end)
    }
}
