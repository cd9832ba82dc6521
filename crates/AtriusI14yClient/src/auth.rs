//! OAuth2 client-credentials token cache.
//!
//! The registry's identity provider hands out bearer tokens with a lifetime
//! (`expires_in`). [`TokenCache`] keeps the current token and only goes back to
//! the token endpoint when the cached one is within a minute of expiring, or
//! when the caller explicitly invalidates it after a `401`.

use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{I14yError, I14yResult};

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Tokens are refreshed this long before their advertised expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn from_response(response: TokenResponse, now: Instant) -> Self {
        let lifetime = Duration::from_secs(response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN));
        Self {
            value: response.access_token,
            expires_at: now + lifetime.saturating_sub(REFRESH_MARGIN),
        }
    }

    fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Client-credentials token source with expiry-based refresh.
pub struct TokenCache {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    current: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(
        http: Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            current: Mutex::new(None),
        }
    }

    /// Return a valid access token, fetching a new one if needed.
    ///
    /// The lock is held across the fetch so that concurrent callers wait for a
    /// single refresh instead of each hitting the token endpoint.
    pub async fn bearer(&self) -> I14yResult<String> {
        let mut current = self.current.lock().await;

        if let Some(token) = current.as_ref() {
            if token.is_valid_at(Instant::now()) {
                return Ok(token.value.clone());
            }
            debug!("Cached access token expired, refreshing");
        }

        let token = self.fetch().await?;
        let value = token.value.clone();
        *current = Some(token);
        Ok(value)
    }

    /// Forget the cached token; the next [`bearer`](Self::bearer) call fetches a fresh one.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }

    async fn fetch(&self) -> I14yResult<AccessToken> {
        info!("Requesting access token from {}", self.token_url);

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(I14yError::Auth(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| I14yError::Auth(format!("malformed token response: {}", e)))?;

        Ok(AccessToken::from_response(payload, Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_expires_one_minute_early() {
        let now = Instant::now();
        let token = AccessToken::from_response(
            TokenResponse {
                access_token: "abc".to_string(),
                expires_in: Some(300),
            },
            now,
        );
        assert_eq!(token.expires_at, now + Duration::from_secs(240));
        assert!(token.is_valid_at(now + Duration::from_secs(239)));
        assert!(!token.is_valid_at(now + Duration::from_secs(240)));
    }

    #[test]
    fn missing_expires_in_defaults_to_an_hour() {
        let now = Instant::now();
        let token = AccessToken::from_response(
            TokenResponse {
                access_token: "abc".to_string(),
                expires_in: None,
            },
            now,
        );
        assert_eq!(token.expires_at, now + Duration::from_secs(3540));
    }

    #[test]
    fn short_lived_token_is_immediately_stale() {
        let now = Instant::now();
        let token = AccessToken::from_response(
            TokenResponse {
                access_token: "abc".to_string(),
                expires_in: Some(30),
            },
            now,
        );
        assert!(!token.is_valid_at(now));
    }
}
