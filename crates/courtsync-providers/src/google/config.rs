//! Google Calendar backend configuration.

use std::path::Path;
use std::time::Duration;

use chrono_tz::Tz;
use serde::Deserialize;
use url::Url;

/// Credentials of an "authorized user".
///
/// This is the JSON written by `gcloud auth application-default login` and
/// similar tools: an OAuth client plus a long-lived refresh token.
#[derive(Clone, Deserialize)]
pub struct AuthorizedUserCredentials {
    /// The OAuth 2.0 client ID.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
    /// Refresh token exchanged for short-lived access tokens.
    pub refresh_token: String,
    /// Credential type, `"authorized_user"` when present.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl std::fmt::Debug for AuthorizedUserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("kind", &self.kind)
            .finish()
    }
}

impl AuthorizedUserCredentials {
    /// Creates credentials from their parts.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            kind: Some("authorized_user".to_string()),
        }
    }

    /// Loads credentials from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read credentials file {}: {}", path.display(), e))?;
        Self::from_json(&content)
    }

    /// Parses credentials from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let credentials: Self = serde_json::from_str(json)
            .map_err(|e| format!("failed to parse credentials JSON: {}", e))?;
        credentials.validate()?;
        Ok(credentials)
    }

    /// Validates that every part is present and the type, if any, matches.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(kind) = &self.kind
            && kind != "authorized_user"
        {
            return Err(format!(
                "unsupported credentials type '{}', expected 'authorized_user'",
                kind
            ));
        }
        if self.client_id.is_empty() {
            return Err("client_id is required".to_string());
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required".to_string());
        }
        if self.refresh_token.is_empty() {
            return Err("refresh_token is required".to_string());
        }
        Ok(())
    }
}

/// Configuration for the Google Calendar backend.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Credentials used for the refresh-token grant.
    pub credentials: AuthorizedUserCredentials,

    /// Timezone events are written in and read back in.
    pub timezone: Tz,

    /// Base URL of the Calendar API v3.
    pub api_base: Url,

    /// OAuth token endpoint.
    pub token_url: Url,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default Calendar API base URL.
    pub const DEFAULT_API_BASE: &'static str = "https://www.googleapis.com/calendar/v3/";

    /// Default OAuth token endpoint.
    pub const DEFAULT_TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";

    /// Creates a configuration with default endpoints.
    pub fn new(credentials: AuthorizedUserCredentials, timezone: Tz) -> Self {
        Self {
            credentials,
            timezone,
            api_base: Url::parse(Self::DEFAULT_API_BASE).expect("valid default API base"),
            token_url: Url::parse(Self::DEFAULT_TOKEN_URL).expect("valid default token URL"),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("courtsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the Calendar API base URL.
    ///
    /// A trailing slash is added when missing so relative paths join below it.
    pub fn with_api_base(mut self, mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        self.api_base = base;
        self
    }

    /// Sets the OAuth token endpoint.
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {}", e))?;

        if self.api_base.cannot_be_a_base() {
            return Err(format!("invalid API base URL: {}", self.api_base));
        }

        Ok(())
    }
}
