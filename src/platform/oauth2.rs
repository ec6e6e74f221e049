//! OAuth2 client-credentials token provider for the upstream platform.
//!
//! A cached bearer token refreshed on expiry, fetched via `reqwest` against
//! the issuer's token endpoint.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use super::PlatformError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Fetches and caches a client-credentials bearer token, refreshing it
/// shortly before expiry.
pub struct TokenProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: Arc<Mutex<Option<CachedToken>>>,
}

impl TokenProvider {
    pub fn new(token_url: impl Into<String>, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cached: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn token(&self) -> Result<String, PlatformError> {
        let mut guard = self.cached.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.token.clone());
            }
        }

        let resp = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(PlatformError::Auth(format!(
                "token endpoint returned {}",
                resp.status()
            )));
        }

        let parsed: TokenResponse = resp.json().await?;
        let expires_at = Instant::now() + Duration::from_secs(parsed.expires_in.saturating_sub(30));
        let token = parsed.access_token.clone();
        *guard = Some(CachedToken { token: parsed.access_token, expires_at });
        Ok(token)
    }
}
