//! Collaborator traits.
//!
//! This module defines the two seams the sync run talks through:
//!
//! - [`AvailabilitySource`] returns the raw availability payload for one date
//! - [`CalendarBackend`] lists, creates and deletes events on a calendar
//!
//! Both traits are object-safe so the orchestrator can hold them as
//! `&dyn` references and tests can substitute in-memory fakes.

use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;
use courtsync_core::{CalendarEvent, NewEvent, TimeWindow};

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Using boxed futures keeps the traits object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something that can report the availability grid of one date.
///
/// Implementations return the payload bytes untouched; decoding is left to
/// [`courtsync_core::parse`].
pub trait AvailabilitySource: Send + Sync {
    /// Returns the name of this source, used in logs and errors.
    fn name(&self) -> &str;

    /// Fetches the raw availability payload for `date`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network failures, non-success statuses or
    /// a failed session bootstrap.
    fn fetch_day(&self, date: NaiveDate) -> BoxFuture<'_, ProviderResult<Vec<u8>>>;
}

/// A calendar service holding one calendar per resource group.
pub trait CalendarBackend: Send + Sync {
    /// Returns the name of this backend (e.g., "google", "memory").
    fn name(&self) -> &str;

    /// Lists the events of `calendar_id` that overlap `window`.
    ///
    /// Pagination is handled internally. Event instants are expressed in the
    /// backend's configured timezone so their rendering is comparable with
    /// desired state.
    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>>;

    /// Creates an event and returns its id.
    ///
    /// `timezone` is the IANA name recorded on the event's start and end.
    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a NewEvent,
        timezone: &'a str,
    ) -> BoxFuture<'a, ProviderResult<String>>;

    /// Deletes an event.
    ///
    /// # Errors
    ///
    /// An event that no longer exists is reported with
    /// [`ProviderErrorCode::NotFound`](crate::ProviderErrorCode::NotFound);
    /// callers decide whether that matters.
    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}
