//! OAuth 2.0 refresh-token grant for Google APIs.
//!
//! Only the refresh half of the authorization-code flow is implemented: the
//! refresh token comes from the authorized-user credentials file and is
//! exchanged for a short-lived access token.

use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

use super::config::AuthorizedUserCredentials;
use super::tokens::TokenInfo;

/// OAuth client for the token endpoint.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: AuthorizedUserCredentials,
    token_url: Url,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    pub fn new(
        credentials: AuthorizedUserCredentials,
        token_url: Url,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::internal("failed to create HTTP client").with_source(e)
            })?;

        Ok(Self {
            credentials,
            token_url,
            http_client,
        })
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns an authentication error when the token endpoint rejects the
    /// grant (revoked or expired refresh token, wrong client).
    pub async fn refresh_access_token(&self) -> ProviderResult<TokenInfo> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        debug!("requesting access token from {}", self.token_url);
        let response = self
            .http_client
            .post(self.token_url.clone())
            .form(&params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("token refresh request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "token refresh failed ({}): {}",
                status, body
            )));
        }

        let token_response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("invalid token response: {}", e)))?;

        info!("refreshed Google access token");
        Ok(TokenInfo::new(
            token_response.access_token,
            token_response.expires_in,
        ))
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}
