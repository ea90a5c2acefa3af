//! Google Calendar backend.
//!
//! This module implements [`CalendarBackend`] for Google Calendar.

use chrono_tz::Tz;
use courtsync_core::{CalendarEvent, NewEvent, TimeWindow};
use tracing::{debug, info};

use crate::error::{ProviderErrorCode, ProviderResult};
use crate::provider::{BoxFuture, CalendarBackend};

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::TokenCache;

/// Google Calendar backend.
///
/// Access tokens are obtained with the refresh-token grant on first use and
/// refreshed when they expire or the API answers 401.
#[derive(Debug)]
pub struct GoogleCalendar {
    timezone: Tz,
    oauth_client: OAuthClient,
    api_client: GoogleCalendarClient,
    tokens: TokenCache,
}

impl GoogleCalendar {
    /// Creates a new backend. No request is made until the first call.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(crate::error::ProviderError::configuration)?;

        let oauth_client =
            OAuthClient::new(config.credentials.clone(), config.token_url.clone(), config.timeout)?;
        let api_client =
            GoogleCalendarClient::new(config.api_base.clone(), config.timeout, &config.user_agent)?;

        Ok(Self {
            timezone: config.timezone,
            oauth_client,
            api_client,
            tokens: TokenCache::new(),
        })
    }

    /// Returns the timezone events are read in.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    async fn access_token(&self) -> ProviderResult<String> {
        self.tokens
            .get_or_refresh(|| self.oauth_client.refresh_access_token())
            .await
            .map_err(|e| e.with_provider("google"))
    }

    /// Runs `call` with a valid token, retrying once with a fresh token when
    /// the API rejects the cached one.
    async fn authorized<'a, T, F, Fut>(&'a self, call: F) -> ProviderResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: std::future::Future<Output = ProviderResult<T>> + 'a,
    {
        let token = self.access_token().await?;
        match call(token).await {
            Err(e) if e.code() == ProviderErrorCode::AuthenticationFailed => {
                debug!("access token rejected, refreshing");
                self.tokens.invalidate().await;
                let token = self.access_token().await?;
                call(token).await
            }
            result => result,
        }
        .map_err(|e| e.with_provider("google"))
    }
}

impl CalendarBackend for GoogleCalendar {
    fn name(&self) -> &str {
        "google"
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(async move {
            self.authorized(move |token| async move {
                self.api_client
                    .list_events(&token, calendar_id, window, self.timezone)
                    .await
            })
            .await
        })
    }

    fn create_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event: &'a NewEvent,
        timezone: &'a str,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(async move {
            let id = self
                .authorized(move |token| async move {
                    self.api_client
                        .insert_event(&token, calendar_id, event, timezone)
                        .await
                })
                .await?;
            info!("created event {} '{}' in {}", id, event.title, calendar_id);
            Ok(id)
        })
    }

    fn delete_event<'a>(
        &'a self,
        calendar_id: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            self.authorized(move |token| async move {
                self.api_client
                    .delete_event(&token, calendar_id, event_id)
                    .await
            })
            .await?;
            info!("deleted event {} from {}", event_id, calendar_id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::AuthorizedUserCredentials;
    use chrono::{DateTime, TimeZone, Utc};
    use chrono_tz::America::Los_Angeles;
    use courtsync_core::render_instant;
    use url::Url;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CALENDAR: &str = "courts@group.calendar.google.com";
    const EVENTS_PATH: &str = "/calendar/v3/calendars/courts%40group.calendar.google.com/events";

    async fn backend(server: &MockServer) -> GoogleCalendar {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.first",
                "expires_in": 3599
            })))
            .mount(server)
            .await;

        let config = GoogleConfig::new(
            AuthorizedUserCredentials::new("client-id", "client-secret", "1//refresh"),
            Los_Angeles,
        )
        .with_api_base(Url::parse(&format!("{}/calendar/v3", server.uri())).unwrap())
        .with_token_url(Url::parse(&format!("{}/token", server.uri())).unwrap());
        GoogleCalendar::new(config).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2025, 4, 20, 7, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 4, 21, 7, 0, 0).unwrap(),
        )
    }

    fn api_event(id: &str, summary: &str, start: &str, end: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "summary": summary,
            "status": "confirmed",
            "start": {"dateTime": start},
            "end": {"dateTime": end}
        })
    }

    #[tokio::test]
    async fn list_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EVENTS_PATH))
            .and(query_param("pageToken", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [api_event("b", "Court 2", "2025-04-20T18:00:00Z", "2025-04-20T19:00:00Z")]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(EVENTS_PATH))
            .and(header("authorization", "Bearer ya29.first"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .and(query_param("timeZone", "America/Los_Angeles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [api_event("a", "Court 1", "2025-04-20T09:00:00-07:00", "2025-04-20T10:00:00-07:00")],
                "nextPageToken": "p2"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let calendar = backend(&server).await;
        let events = calendar.list_events(CALENDAR, &window()).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "a");
        assert_eq!(events[1].title, "Court 2");
        assert_eq!(render_instant(&events[1].start), "2025-04-20T11:00:00-07:00");
    }

    #[tokio::test]
    async fn create_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(EVENTS_PATH))
            .and(body_partial_json(serde_json::json!({
                "summary": "Court 4",
                "start": {"dateTime": "2025-04-20T18:30:00-07:00", "timeZone": "America/Los_Angeles"},
                "end": {"dateTime": "2025-04-20T19:00:00-07:00", "timeZone": "America/Los_Angeles"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "new-1",
                "summary": "Court 4"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let calendar = backend(&server).await;
        let event = NewEvent::new(
            "Court 4",
            DateTime::parse_from_rfc3339("2025-04-20T18:30:00-07:00").unwrap(),
            DateTime::parse_from_rfc3339("2025-04-20T19:00:00-07:00").unwrap(),
        );
        let id = calendar
            .create_event(CALENDAR, &event, "America/Los_Angeles")
            .await
            .unwrap();
        assert_eq!(id, "new-1");
    }

    #[tokio::test]
    async fn delete_gone_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/gone-1", EVENTS_PATH)))
            .respond_with(ResponseTemplate::new(410).set_body_string("Resource has been deleted"))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/ok-1", EVENTS_PATH)))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let calendar = backend(&server).await;
        calendar.delete_event(CALENDAR, "ok-1").await.unwrap();

        let err = calendar.delete_event(CALENDAR, "gone-1").await.unwrap_err();
        assert!(err.is_gone());
        assert_eq!(err.provider(), Some("google"));
    }

    #[tokio::test]
    async fn forbidden_is_authorization_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EVENTS_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("insufficient permissions"))
            .mount(&server)
            .await;

        let calendar = backend(&server).await;
        let err = calendar.list_events(CALENDAR, &window()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthorizationFailed);
    }

    #[tokio::test]
    async fn rejected_token_is_refreshed_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EVENTS_PATH))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let calendar = backend(&server).await;
        let err = calendar.list_events(CALENDAR, &window()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }
}
