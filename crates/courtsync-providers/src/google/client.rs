//! Google Calendar API client.
//!
//! This module provides a low-level HTTP client for the Calendar API v3,
//! handling request building, status mapping and response parsing. Access
//! tokens are passed per call; refreshing them is the caller's job.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use courtsync_core::{CalendarEvent, NewEvent, TimeWindow, local_instant, render_instant};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Page size requested from `events.list`; 2500 is the API maximum.
const PAGE_SIZE: u32 = 2500;

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    api_base: Url,
}

impl GoogleCalendarClient {
    /// Creates a new client rooted at `api_base`.
    pub fn new(api_base: Url, timeout: Duration, user_agent: &str) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal("failed to create HTTP client").with_source(e)
            })?;

        Ok(Self {
            http_client,
            api_base,
        })
    }

    fn events_url(&self, calendar_id: &str) -> ProviderResult<Url> {
        self.api_base
            .join(&format!(
                "calendars/{}/events",
                urlencoding::encode(calendar_id)
            ))
            .map_err(|e| ProviderError::configuration(format!("invalid events URL: {}", e)))
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> ProviderResult<Url> {
        self.api_base
            .join(&format!(
                "calendars/{}/events/{}",
                urlencoding::encode(calendar_id),
                urlencoding::encode(event_id)
            ))
            .map_err(|e| ProviderError::configuration(format!("invalid event URL: {}", e)))
    }

    /// Lists the events of a calendar overlapping `window`.
    ///
    /// Recurring events are expanded server-side. Cancelled events and
    /// events without usable times are dropped. Instants are re-expressed in
    /// `tz`.
    pub async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: &TimeWindow,
        tz: Tz,
    ) -> ProviderResult<Vec<CalendarEvent>> {
        let mut all_events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_events_page(access_token, calendar_id, window, tz, page_token.as_deref())
                .await?;

            all_events.extend(
                page.items
                    .into_iter()
                    .filter_map(|event| convert_event(event, tz)),
            );

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "fetched {} events from calendar {}",
            all_events.len(),
            calendar_id
        );
        Ok(all_events)
    }

    /// Fetches a single page of events.
    async fn list_events_page(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: &TimeWindow,
        tz: Tz,
        page_token: Option<&str>,
    ) -> ProviderResult<EventListResponse> {
        let url = self.events_url(calendar_id)?;

        let mut request = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", render_instant(&window.start)),
                ("timeMax", render_instant(&window.end)),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("timeZone", tz.name().to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
            ]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(request_error)?;
        let response = check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
        })
    }

    /// Inserts an event and returns its id.
    pub async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &NewEvent,
        timezone: &str,
    ) -> ProviderResult<String> {
        let url = self.events_url(calendar_id)?;
        let body = InsertEventRequest {
            summary: &event.title,
            start: ApiWriteTime {
                date_time: render_instant(&event.start),
                time_zone: timezone,
            },
            end: ApiWriteTime {
                date_time: render_instant(&event.end),
                time_zone: timezone,
            },
        };

        let response = self
            .http_client
            .post(url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;
        let response = check_status(response).await?;

        let created: InsertEventResponse = response.json().await.map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse inserted event: {}", e))
        })?;
        Ok(created.id)
    }

    /// Deletes an event.
    ///
    /// A 404 or 410 comes back as [`ProviderErrorCode::NotFound`](crate::ProviderErrorCode::NotFound).
    pub async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> ProviderResult<()> {
        let url = self.event_url(calendar_id, event_id)?;

        let response = self
            .http_client
            .delete(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(request_error)?;
        check_status(response).await?;
        Ok(())
    }
}

fn request_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network("request timeout")
    } else if e.is_connect() {
        ProviderError::network(format!("connection failed: {}", e))
    } else {
        ProviderError::network(format!("request failed: {}", e))
    }
}

/// Passes successful responses through and maps everything else to a
/// [`ProviderError`] by status.
async fn check_status(response: reqwest::Response) -> ProviderResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )));
    }

    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::from_status(status.as_u16(), body))
}

/// Converts an API event to a [`CalendarEvent`] in `tz`.
fn convert_event(event: ApiEvent, tz: Tz) -> Option<CalendarEvent> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let id = event.id?;
    let start = event_time(&event.start, tz)
        .map_err(|e| warn!("event {} has unusable start: {}", id, e))
        .ok()?;
    let end = event_time(&event.end, tz)
        .map_err(|e| warn!("event {} has unusable end: {}", id, e))
        .ok()?;

    Some(CalendarEvent::new(
        id,
        event.summary.unwrap_or_default(),
        start,
        end,
    ))
}

/// Reads a timed or all-day event boundary as an instant in `tz`.
///
/// All-day boundaries become local midnight.
fn event_time(time: &ApiEventTime, tz: Tz) -> Result<DateTime<chrono::FixedOffset>, String> {
    match (&time.date_time, &time.date) {
        (Some(dt), _) => DateTime::parse_from_rfc3339(dt)
            .map(|parsed| parsed.with_timezone(&tz).fixed_offset())
            .map_err(|e| format!("invalid dateTime '{}': {}", dt, e)),
        (None, Some(date)) => {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| format!("invalid date '{}': {}", date, e))?;
            let midnight = NaiveTime::from_hms_opt(0, 0, 0).ok_or("invalid midnight")?;
            local_instant(date, midnight, &tz)
                .map(|instant| instant.fixed_offset())
                .ok_or_else(|| format!("midnight of {} does not exist in {}", date, tz.name()))
        }
        (None, None) => Err("no dateTime or date".to_string()),
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    start: ApiEventTime,
    end: ApiEventTime,
    status: Option<String>,
}

/// Event time from the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

/// Body of an events.insert call.
#[derive(Debug, Serialize)]
struct InsertEventRequest<'a> {
    summary: &'a str,
    start: ApiWriteTime<'a>,
    end: ApiWriteTime<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiWriteTime<'a> {
    date_time: String,
    time_zone: &'a str,
}

#[derive(Debug, Deserialize)]
struct InsertEventResponse {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Los_Angeles;

    #[test]
    fn parse_event_list_response() {
        let json = r#"{
            "items": [
                {
                    "id": "event1",
                    "summary": "Court 1",
                    "start": {"dateTime": "2025-04-20T16:00:00Z"},
                    "end": {"dateTime": "2025-04-20T17:00:00Z"},
                    "status": "confirmed"
                }
            ],
            "nextPageToken": "page-2"
        }"#;

        let response: EventListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.next_page_token.as_deref(), Some("page-2"));
    }

    #[test]
    fn utc_times_are_reexpressed_in_timezone() {
        let event: ApiEvent = serde_json::from_str(
            r#"{
                "id": "event1",
                "summary": "Court 1",
                "start": {"dateTime": "2025-04-20T16:00:00Z"},
                "end": {"dateTime": "2025-04-20T17:00:00Z"}
            }"#,
        )
        .unwrap();

        let converted = convert_event(event, Los_Angeles).unwrap();
        assert_eq!(render_instant(&converted.start), "2025-04-20T09:00:00-07:00");
        assert_eq!(render_instant(&converted.end), "2025-04-20T10:00:00-07:00");
    }

    #[test]
    fn all_day_event_starts_at_local_midnight() {
        let event: ApiEvent = serde_json::from_str(
            r#"{
                "id": "event1",
                "summary": "Court closure",
                "start": {"date": "2025-04-20"},
                "end": {"date": "2025-04-21"}
            }"#,
        )
        .unwrap();

        let converted = convert_event(event, Los_Angeles).unwrap();
        assert_eq!(render_instant(&converted.start), "2025-04-20T00:00:00-07:00");
        assert_eq!(render_instant(&converted.end), "2025-04-21T00:00:00-07:00");
    }

    #[test]
    fn cancelled_and_timeless_events_are_dropped() {
        let cancelled: ApiEvent = serde_json::from_str(
            r#"{
                "id": "event1",
                "status": "cancelled",
                "start": {"dateTime": "2025-04-20T16:00:00Z"},
                "end": {"dateTime": "2025-04-20T17:00:00Z"}
            }"#,
        )
        .unwrap();
        assert!(convert_event(cancelled, Los_Angeles).is_none());

        let timeless: ApiEvent =
            serde_json::from_str(r#"{"id": "event2", "start": {}, "end": {}}"#).unwrap();
        assert!(convert_event(timeless, Los_Angeles).is_none());
    }

    #[test]
    fn insert_body_shape() {
        let body = InsertEventRequest {
            summary: "Court 4",
            start: ApiWriteTime {
                date_time: "2025-04-20T18:30:00-07:00".to_string(),
                time_zone: "America/Los_Angeles",
            },
            end: ApiWriteTime {
                date_time: "2025-04-20T19:00:00-07:00".to_string(),
                time_zone: "America/Los_Angeles",
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["summary"], "Court 4");
        assert_eq!(json["start"]["dateTime"], "2025-04-20T18:30:00-07:00");
        assert_eq!(json["end"]["timeZone"], "America/Los_Angeles");
    }
}
