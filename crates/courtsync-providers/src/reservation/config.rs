//! Reservation site configuration.

use std::time::Duration;

use regex::Regex;
use url::Url;

/// Configuration for the reservation-site availability source.
#[derive(Debug, Clone)]
pub struct ReservationConfig {
    /// Site root; the paths below are joined onto it.
    pub base_url: Url,

    /// Page that sets the session cookies and embeds the CSRF token.
    pub landing_path: String,

    /// JSON endpoint answering one availability grid per date.
    pub availability_path: String,

    /// Facility group whose resources are requested.
    pub facility_group_id: u64,

    /// Pattern whose first capture group is the CSRF token.
    pub csrf_pattern: Regex,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl ReservationConfig {
    /// Default site root.
    pub const DEFAULT_BASE_URL: &'static str = "https://anc.apm.activecommunities.com/haywardrec/";

    /// Default landing page, relative to the site root.
    pub const DEFAULT_LANDING_PATH: &'static str = "reservation/landing/quick?groupId=2";

    /// Default availability endpoint, relative to the site root.
    pub const DEFAULT_AVAILABILITY_PATH: &'static str =
        "rest/reservation/quickreservation/availability?locale=en-US";

    /// Default facility group.
    pub const DEFAULT_FACILITY_GROUP_ID: u64 = 2;

    /// Default CSRF token pattern.
    pub const DEFAULT_CSRF_PATTERN: &'static str = r#"__csrfToken\s*=\s*"([^"]+)""#;

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for the site rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, String> {
        let mut base_url =
            Url::parse(base_url.as_ref()).map_err(|e| format!("invalid base URL: {}", e))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let csrf_pattern = Regex::new(Self::DEFAULT_CSRF_PATTERN)
            .map_err(|e| format!("invalid CSRF pattern: {}", e))?;

        Ok(Self {
            base_url,
            landing_path: Self::DEFAULT_LANDING_PATH.to_string(),
            availability_path: Self::DEFAULT_AVAILABILITY_PATH.to_string(),
            facility_group_id: Self::DEFAULT_FACILITY_GROUP_ID,
            csrf_pattern,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("courtsync/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Sets the landing page path.
    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    /// Sets the availability endpoint path.
    pub fn with_availability_path(mut self, path: impl Into<String>) -> Self {
        self.availability_path = path.into();
        self
    }

    /// Sets the facility group.
    pub fn with_facility_group_id(mut self, id: u64) -> Self {
        self.facility_group_id = id;
        self
    }

    /// Sets the CSRF token pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern does not compile or has no capture
    /// group.
    pub fn with_csrf_pattern(mut self, pattern: &str) -> Result<Self, String> {
        let regex = Regex::new(pattern).map_err(|e| format!("invalid CSRF pattern: {}", e))?;
        if regex.captures_len() < 2 {
            return Err("CSRF pattern needs a capture group for the token".to_string());
        }
        self.csrf_pattern = regex;
        Ok(self)
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the absolute landing page URL.
    pub fn landing_url(&self) -> Result<Url, String> {
        self.base_url
            .join(&self.landing_path)
            .map_err(|e| format!("invalid landing path '{}': {}", self.landing_path, e))
    }

    /// Returns the absolute availability endpoint URL.
    pub fn availability_url(&self) -> Result<Url, String> {
        self.base_url.join(&self.availability_path).map_err(|e| {
            format!(
                "invalid availability path '{}': {}",
                self.availability_path, e
            )
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.landing_url()?;
        self.availability_url()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReservationConfig::new(ReservationConfig::DEFAULT_BASE_URL).unwrap();
        assert_eq!(config.facility_group_id, 2);
        assert_eq!(
            config.landing_url().unwrap().as_str(),
            "https://anc.apm.activecommunities.com/haywardrec/reservation/landing/quick?groupId=2"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn base_without_trailing_slash() {
        let config = ReservationConfig::new("http://127.0.0.1:8080/site")
            .unwrap()
            .with_availability_path("api/availability");
        assert_eq!(
            config.availability_url().unwrap().as_str(),
            "http://127.0.0.1:8080/site/api/availability"
        );
    }

    #[test]
    fn invalid_base_url() {
        assert!(ReservationConfig::new("not a url").is_err());
    }

    #[test]
    fn default_pattern_extracts_token() {
        let config = ReservationConfig::new(ReservationConfig::DEFAULT_BASE_URL).unwrap();
        let page = r#"<script>window.__csrfToken = "abc-123";</script>"#;
        let token = config
            .csrf_pattern
            .captures(page)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());
        assert_eq!(token, Some("abc-123"));
    }

    #[test]
    fn csrf_pattern_needs_capture_group() {
        let config = ReservationConfig::new(ReservationConfig::DEFAULT_BASE_URL).unwrap();
        assert!(config.clone().with_csrf_pattern("csrf=[a-z]+").is_err());
        assert!(config.clone().with_csrf_pattern("csrf=(").is_err());
        assert!(config.with_csrf_pattern(r#"csrf="(\w+)""#).is_ok());
    }
}
