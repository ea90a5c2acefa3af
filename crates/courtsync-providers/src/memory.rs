//! In-memory collaborators.
//!
//! [`MemoryCalendar`] and [`StaticAvailability`] implement the collaborator
//! traits without any I/O. They record every call and can be told to fail,
//! which makes them suitable for exercising a full sync run.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use courtsync_core::{CalendarEvent, NewEvent, TimeWindow};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{AvailabilitySource, BoxFuture, CalendarBackend};

/// A call made against a [`MemoryCalendar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarCall {
    List { calendar_id: String },
    Create { calendar_id: String, title: String },
    Delete { calendar_id: String, event_id: String },
}

impl CalendarCall {
    /// Returns true for create and delete calls.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::List { .. })
    }
}

#[derive(Debug, Default)]
struct CalendarState {
    events: BTreeMap<String, Vec<CalendarEvent>>,
    calls: Vec<CalendarCall>,
    next_id: u64,
    failing_lists: HashSet<String>,
    failing_creates: HashSet<String>,
    failing_deletes: HashSet<String>,
    vanished: HashSet<String>,
}

/// A calendar backend that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryCalendar {
    state: Mutex<CalendarState>,
}

impl MemoryCalendar {
    /// Creates an empty calendar backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CalendarState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seeds an existing event.
    pub fn insert(&self, calendar_id: &str, event: CalendarEvent) {
        self.state()
            .events
            .entry(calendar_id.to_string())
            .or_default()
            .push(event);
    }

    /// Returns the events of a calendar, in insertion order.
    pub fn events(&self, calendar_id: &str) -> Vec<CalendarEvent> {
        self.state()
            .events
            .get(calendar_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns every call made so far.
    pub fn calls(&self) -> Vec<CalendarCall> {
        self.state().calls.clone()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Makes listing `calendar_id` fail with a server error.
    pub fn fail_list(&self, calendar_id: &str) {
        self.state().failing_lists.insert(calendar_id.to_string());
    }

    /// Makes creating an event titled `title` fail with a server error.
    pub fn fail_create(&self, title: &str) {
        self.state().failing_creates.insert(title.to_string());
    }

    /// Makes deleting `event_id` fail with a server error.
    pub fn fail_delete(&self, event_id: &str) {
        self.state().failing_deletes.insert(event_id.to_string());
    }

    /// Keeps `event_id` visible to listings but reports it gone on delete,
    /// as when another client removed it in between.
    pub fn vanish_on_delete(&self, event_id: &str) {
        self.state().vanished.insert(event_id.to_string());
    }
}

fn overlaps(event: &CalendarEvent, window: &TimeWindow) -> bool {
    event.start < window.end && event.end > window.start
}

impl CalendarBackend for MemoryCalendar {
    fn name(&self) -> &str {
        "memory"
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        let result = {
            let mut state = self.state();
            state.calls.push(CalendarCall::List {
                calendar_id: calendar_id.to_string(),
            });
            if state.failing_lists.contains(calendar_id) {
                Err(ProviderError::server(format!("listing {} failed", calendar_id))
                    .with_provider("memory"))
            } else {
                let mut events: Vec<CalendarEvent> = state
                    .events
                    .get(calendar_id)
                    .into_iter()
                    .flatten()
                    .filter(|event| overlaps(event, window))
                    .cloned()
                    .collect();
                events.sort_by_key(|event| event.start);
                Ok(events)
            }
        };
        Box::pin(async move { result })
    }

    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a NewEvent,
        _timezone: &'a str,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        let result = {
            let mut state = self.state();
            state.calls.push(CalendarCall::Create {
                calendar_id: calendar_id.to_string(),
                title: event.title.clone(),
            });
            if state.failing_creates.contains(&event.title) {
                Err(ProviderError::server(format!("creating '{}' failed", event.title))
                    .with_provider("memory"))
            } else {
                state.next_id += 1;
                let id = format!("evt-{}", state.next_id);
                state
                    .events
                    .entry(calendar_id.to_string())
                    .or_default()
                    .push(CalendarEvent::new(&id, &event.title, event.start, event.end));
                Ok(id)
            }
        };
        Box::pin(async move { result })
    }

    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        let result = {
            let mut state = self.state();
            state.calls.push(CalendarCall::Delete {
                calendar_id: calendar_id.to_string(),
                event_id: event_id.to_string(),
            });
            if state.failing_deletes.contains(event_id) {
                Err(ProviderError::server(format!("deleting {} failed", event_id))
                    .with_provider("memory"))
            } else if state.vanished.contains(event_id) {
                Err(ProviderError::not_found(format!("event {} is gone", event_id))
                    .with_provider("memory"))
            } else {
                let events = state.events.entry(calendar_id.to_string()).or_default();
                match events.iter().position(|event| event.id == event_id) {
                    Some(index) => {
                        events.remove(index);
                        Ok(())
                    }
                    None => Err(ProviderError::not_found(format!(
                        "event {} not found",
                        event_id
                    ))
                    .with_provider("memory")),
                }
            }
        };
        Box::pin(async move { result })
    }
}

/// An availability source serving fixed payloads per date.
#[derive(Debug, Default)]
pub struct StaticAvailability {
    payloads: HashMap<NaiveDate, Vec<u8>>,
    fallback: Option<Vec<u8>>,
    failing: HashSet<NaiveDate>,
    fetched: Mutex<Vec<NaiveDate>>,
}

impl StaticAvailability {
    /// Creates a source with no payloads.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `payload` for `date`.
    pub fn with_payload(mut self, date: NaiveDate, payload: impl Into<Vec<u8>>) -> Self {
        self.payloads.insert(date, payload.into());
        self
    }

    /// Serves `payload` for every date without its own payload.
    pub fn with_fallback(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.fallback = Some(payload.into());
        self
    }

    /// Makes fetching `date` fail with a network error.
    pub fn with_failure(mut self, date: NaiveDate) -> Self {
        self.failing.insert(date);
        self
    }

    /// Returns the dates fetched so far, in call order.
    pub fn fetched(&self) -> Vec<NaiveDate> {
        self.fetched
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AvailabilitySource for StaticAvailability {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch_day(&self, date: NaiveDate) -> BoxFuture<'_, ProviderResult<Vec<u8>>> {
        self.fetched
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(date);

        let result = if self.failing.contains(&date) {
            Err(ProviderError::network(format!("fetching {} failed", date)).with_provider("static"))
        } else {
            self.payloads
                .get(&date)
                .or(self.fallback.as_ref())
                .cloned()
                .ok_or_else(|| {
                    ProviderError::not_found(format!("no payload for {}", date))
                        .with_provider("static")
                })
        };
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 4, 20, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 21, 7, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn create_list_delete() {
        let calendar = MemoryCalendar::new();
        let event = NewEvent::new(
            "Court 1",
            at("2025-04-20T09:00:00-07:00"),
            at("2025-04-20T10:00:00-07:00"),
        );

        let id = calendar
            .create_event("cal", &event, "America/Los_Angeles")
            .await
            .unwrap();
        let listed = calendar.list_events("cal", &window()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].identity(), event.identity());

        calendar.delete_event("cal", &id).await.unwrap();
        assert!(calendar.events("cal").is_empty());

        let err = calendar.delete_event("cal", &id).await.unwrap_err();
        assert!(err.is_gone());
        assert_eq!(calendar.calls().iter().filter(|c| c.is_mutation()).count(), 3);
    }

    #[tokio::test]
    async fn listing_respects_window() {
        let calendar = MemoryCalendar::new();
        calendar.insert(
            "cal",
            CalendarEvent::new(
                "inside",
                "Court 1",
                at("2025-04-20T23:30:00-07:00"),
                at("2025-04-21T00:00:00-07:00"),
            ),
        );
        calendar.insert(
            "cal",
            CalendarEvent::new(
                "after",
                "Court 1",
                at("2025-04-21T00:00:00-07:00"),
                at("2025-04-21T00:30:00-07:00"),
            ),
        );

        let listed = calendar.list_events("cal", &window()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "inside");
    }

    #[tokio::test]
    async fn injected_failures() {
        let calendar = MemoryCalendar::new();
        calendar.fail_list("cal");
        let err = calendar.list_events("cal", &window()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ServerError);

        calendar.insert(
            "other",
            CalendarEvent::new(
                "x",
                "Court 1",
                at("2025-04-20T09:00:00-07:00"),
                at("2025-04-20T10:00:00-07:00"),
            ),
        );
        calendar.vanish_on_delete("x");
        assert!(calendar.delete_event("other", "x").await.unwrap_err().is_gone());
        assert_eq!(calendar.events("other").len(), 1);
    }

    #[tokio::test]
    async fn static_availability_serves_payloads() {
        let d1 = NaiveDate::from_ymd_opt(2025, 4, 20).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 4, 21).unwrap();
        let d3 = NaiveDate::from_ymd_opt(2025, 4, 22).unwrap();
        let source = StaticAvailability::new()
            .with_payload(d1, "one")
            .with_failure(d2);

        assert_eq!(source.fetch_day(d1).await.unwrap(), b"one".to_vec());
        assert!(source.fetch_day(d2).await.is_err());
        assert!(source.fetch_day(d3).await.unwrap_err().is_gone());
        assert_eq!(source.fetched(), vec![d1, d2, d3]);

        let source = StaticAvailability::new().with_fallback("any");
        assert_eq!(source.fetch_day(d3).await.unwrap(), b"any".to_vec());
    }
}
