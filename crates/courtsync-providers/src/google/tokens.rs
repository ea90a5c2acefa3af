//! Access token caching.
//!
//! Access tokens live only in memory for the duration of a run. The refresh
//! token in the credentials file is the only persisted secret.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

/// Seconds subtracted from the advertised lifetime so a token is refreshed
/// before it actually expires.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// An access token and its expiry.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    /// The access token for API requests.
    pub access_token: String,

    /// When the access token expires, minus the refresh buffer.
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenInfo {
    /// Creates a token from an OAuth response.
    pub fn new(access_token: impl Into<String>, expires_in_secs: Option<i64>) -> Self {
        Self::issued_at(access_token, expires_in_secs, Utc::now())
    }

    fn issued_at(
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        let expires_at = expires_in_secs
            .map(|secs| now + Duration::seconds(secs) - Duration::seconds(EXPIRY_BUFFER_SECS));

        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}

/// In-memory slot holding the current access token.
///
/// The lock is held across a refresh so concurrent callers wait for one
/// token instead of each requesting their own.
#[derive(Debug, Default)]
pub struct TokenCache {
    current: Mutex<Option<TokenInfo>>,
}

impl TokenCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a valid access token, calling `refresh` when none is cached
    /// or the cached one expired.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<TokenInfo, E>>,
    {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref()
            && !token.is_expired()
        {
            return Ok(token.access_token.clone());
        }

        let token = refresh().await?;
        let access_token = token.access_token.clone();
        *current = Some(token);
        Ok(access_token)
    }

    /// Drops the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }
}
