//! Reservation site availability source.
//!
//! This module provides [`ReservationSource`], an
//! [`AvailabilitySource`](crate::AvailabilitySource) backed by an
//! ActiveNet-style public reservation site.
//!
//! # Session Flow
//!
//! 1. The first fetch loads the landing page with a cookie-enabled client
//! 2. The CSRF token is scraped from the page with a regex
//! 3. Every day fetch POSTs a JSON request carrying the token header
//!
//! The session is created with the source and lives exactly as long as it,
//! so one run bootstraps at most once.

mod config;
mod session;

pub use config::ReservationConfig;
pub use session::ReservationSession;

use chrono::NaiveDate;

use crate::error::ProviderResult;
use crate::provider::{AvailabilitySource, BoxFuture};

/// Availability source for the reservation site.
#[derive(Debug)]
pub struct ReservationSource {
    session: ReservationSession,
}

impl ReservationSource {
    /// Creates a source with a fresh, not yet bootstrapped session.
    pub fn new(config: ReservationConfig) -> ProviderResult<Self> {
        Ok(Self {
            session: ReservationSession::new(config)?,
        })
    }

    /// Returns the underlying session.
    pub fn session(&self) -> &ReservationSession {
        &self.session
    }
}

impl AvailabilitySource for ReservationSource {
    fn name(&self) -> &str {
        "reservation"
    }

    fn fetch_day(&self, date: NaiveDate) -> BoxFuture<'_, ProviderResult<Vec<u8>>> {
        Box::pin(async move {
            self.session
                .fetch_availability(date)
                .await
                .map_err(|e| e.with_provider("reservation"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LANDING: &str = r#"<html><head><script>
        window.__csrfToken = "csrf-42";
    </script></head></html>"#;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    fn source(server: &MockServer) -> ReservationSource {
        let config = ReservationConfig::new(server.uri())
            .unwrap()
            .with_landing_path("landing")
            .with_availability_path("api/availability")
            .with_facility_group_id(7);
        ReservationSource::new(config).unwrap()
    }

    async fn mount_landing(server: &MockServer, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/landing"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "JSESSIONID=s1; Path=/")
                    .set_body_string(LANDING),
            )
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetch_sends_token_cookie_and_body() {
        let server = MockServer::start().await;
        mount_landing(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/api/availability"))
            .and(header("X-CSRF-Token", "csrf-42"))
            .and(header("cookie", "JSESSIONID=s1"))
            .and(body_partial_json(serde_json::json!({
                "facility_group_id": 7,
                "reserve_date": "2025-04-20",
                "resident": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"body": {}}"#))
            .expect(1)
            .mount(&server)
            .await;

        let source = source(&server);
        assert!(!source.session().is_bootstrapped());

        let body = source.fetch_day(date(20)).await.unwrap();
        assert_eq!(body, br#"{"body": {}}"#.to_vec());
        assert!(source.session().is_bootstrapped());
    }

    #[tokio::test]
    async fn session_is_bootstrapped_once() {
        let server = MockServer::start().await;
        mount_landing(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/api/availability"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(3)
            .mount(&server)
            .await;

        let source = source(&server);
        for d in 20..23 {
            source.fetch_day(date(d)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn missing_token_fails_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/landing"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/availability"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let source = source(&server);
        let err = source.fetch_day(date(20)).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
        assert_eq!(err.provider(), Some("reservation"));
        assert!(!source.session().is_bootstrapped());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        mount_landing(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/api/availability"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = source(&server).fetch_day(date(20)).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
        assert!(err.message().contains("maintenance"));
    }

    #[tokio::test]
    async fn rejected_landing_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/landing"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = source(&server).fetch_day(date(20)).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthorizationFailed);
    }
}
