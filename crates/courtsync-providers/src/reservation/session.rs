//! Reservation site session.
//!
//! The site only answers availability requests that carry the session
//! cookies set by its landing page and the CSRF token embedded in that page.
//! A [`ReservationSession`] owns both for the lifetime of one run.

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

use super::config::ReservationConfig;

/// Header carrying the CSRF token.
const CSRF_HEADER: &str = "X-CSRF-Token";

/// Cookie-carrying HTTP session with a lazily scraped CSRF token.
#[derive(Debug)]
pub struct ReservationSession {
    config: ReservationConfig,
    http_client: reqwest::Client,
    csrf_token: OnceCell<String>,
}

impl ReservationSession {
    /// Creates a session. Nothing is requested until the first fetch.
    pub fn new(config: ReservationConfig) -> ProviderResult<Self> {
        config.validate().map_err(ProviderError::configuration)?;

        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::internal("failed to create HTTP client").with_source(e)
            })?;

        Ok(Self {
            config,
            http_client,
            csrf_token: OnceCell::new(),
        })
    }

    /// Returns true once the CSRF token has been scraped.
    pub fn is_bootstrapped(&self) -> bool {
        self.csrf_token.initialized()
    }

    /// Returns the CSRF token, loading the landing page on first use.
    ///
    /// A failed bootstrap is not cached; the next call tries again.
    pub async fn csrf_token(&self) -> ProviderResult<&str> {
        self.csrf_token
            .get_or_try_init(|| self.bootstrap())
            .await
            .map(String::as_str)
    }

    async fn bootstrap(&self) -> ProviderResult<String> {
        let url = self.config.landing_url().map_err(ProviderError::configuration)?;
        debug!("bootstrapping reservation session from {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("landing page request failed: {}", e)))?;

        let status = response.status();
        let page = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read landing page: {}", e)))?;
        if !status.is_success() {
            return Err(ProviderError::from_status(
                status.as_u16(),
                "landing page request rejected",
            ));
        }

        let token = extract_csrf_token(&self.config, &page).ok_or_else(|| {
            ProviderError::invalid_response("CSRF token not found on landing page")
        })?;

        info!("reservation session established");
        Ok(token)
    }

    /// Posts the availability request for `date` and returns the body.
    pub async fn fetch_availability(&self, date: NaiveDate) -> ProviderResult<Vec<u8>> {
        let token = self.csrf_token().await?;
        let url = self
            .config
            .availability_url()
            .map_err(ProviderError::configuration)?;

        let request = AvailabilityRequest::new(self.config.facility_group_id, date);
        debug!("requesting availability for {}", date);

        let response = self
            .http_client
            .post(url)
            .header(CSRF_HEADER, token)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(e, date))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        let body = response.bytes().await.map_err(|e| {
            ProviderError::network(format!("failed to read availability for {}: {}", date, e))
        })?;
        Ok(body.to_vec())
    }

    /// Returns the site root this session talks to.
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }
}

fn request_error(e: reqwest::Error, date: NaiveDate) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network(format!("availability request for {} timed out", date))
    } else {
        ProviderError::network(format!("availability request for {} failed: {}", date, e))
    }
}

fn extract_csrf_token(config: &ReservationConfig, page: &str) -> Option<String> {
    config
        .csrf_pattern
        .captures(page)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|token| !token.is_empty())
}

/// Body of one availability request.
#[derive(Debug, Serialize)]
struct AvailabilityRequest {
    facility_group_id: u64,
    customer_id: u64,
    company_id: u64,
    reserve_date: String,
    start_time: String,
    end_time: String,
    resident: bool,
    reload: bool,
    change_time_range: bool,
}

impl AvailabilityRequest {
    fn new(facility_group_id: u64, date: NaiveDate) -> Self {
        Self {
            facility_group_id,
            customer_id: 0,
            company_id: 0,
            reserve_date: date.format("%Y-%m-%d").to_string(),
            start_time: String::new(),
            end_time: String::new(),
            resident: true,
            reload: false,
            change_time_range: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 20).unwrap();
        let body = serde_json::to_value(AvailabilityRequest::new(2, date)).unwrap();
        assert_eq!(body["facility_group_id"], 2);
        assert_eq!(body["reserve_date"], "2025-04-20");
        assert_eq!(body["resident"], true);
        assert_eq!(body["start_time"], "");
    }

    #[test]
    fn token_extraction() {
        let config = ReservationConfig::new("http://localhost/").unwrap();
        assert_eq!(
            extract_csrf_token(&config, r#"var __csrfToken="tok-1";"#).as_deref(),
            Some("tok-1")
        );
        assert!(extract_csrf_token(&config, "<html>nothing here</html>").is_none());
    }
}
