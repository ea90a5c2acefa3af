//! Collaborators of the sync engine.
//!
//! This crate provides everything that talks to the outside world:
//!
//! - [`AvailabilitySource`] - Returns the raw availability payload of a date
//! - [`CalendarBackend`] - Lists, creates and deletes calendar events
//! - [`ProviderError`] - Error types for collaborator operations
//! - [`memory`] - In-memory implementations of both traits
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐          ┌──────────────────┐
//! │ Reservation site │          │ Google Calendar  │
//! └────────┬─────────┘          └────────┬─────────┘
//!          │                             │
//!          ▼                             ▼
//! ┌──────────────────┐          ┌──────────────────┐
//! │ReservationSource │          │  GoogleCalendar  │
//! └────────┬─────────┘          └────────┬─────────┘
//!          │ AvailabilitySource          │ CalendarBackend
//!          ▼                             ▼
//!    raw payload bytes         CalendarEvent / NewEvent
//! ```
//!
//! # Example
//!
//! ```ignore
//! use courtsync_providers::{AvailabilitySource, CalendarBackend};
//!
//! async fn peek(source: &dyn AvailabilitySource, date: NaiveDate) -> ProviderResult<usize> {
//!     Ok(source.fetch_day(date).await?.len())
//! }
//! ```

pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod memory;
pub mod provider;
#[cfg(feature = "reservation")]
pub mod reservation;

// Re-export main types at crate root
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use memory::{CalendarCall, MemoryCalendar, StaticAvailability};
pub use provider::{AvailabilitySource, BoxFuture, CalendarBackend};
