//! Reconciliation engine: availability parsing, interval consolidation and
//! event diffing.
//!
//! ```text
//! raw payload ──parse──▶ Availability ──consolidate──▶ DesiredState
//!                                                          │
//!                     existing CalendarEvents ──diff───────┘──▶ EventDiff
//! ```
//!
//! Everything in this crate is pure; fetching payloads and talking to a
//! calendar belong to `courtsync-providers`.

pub mod availability;
pub mod consolidate;
pub mod diff;
pub mod error;
pub mod event;
pub mod time;
pub mod tracing;

pub use availability::{
    Availability, DayAvailability, GroupAvailability, MissingDetailPolicy, ParseRules, SlotMap,
    parse,
};
pub use consolidate::{DesiredState, GroupIntervals, Interval, consolidate};
pub use diff::{EventDiff, diff};
pub use error::{ConsolidateError, DataFormatError};
pub use event::{CalendarEvent, IdentityTriple, NewEvent, render_instant};
pub use time::{SLOT_MINUTES, TimeWindow, local_instant, slot_duration, sync_dates};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
