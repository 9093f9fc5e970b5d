//! Saviynt Authentication
//!
//! Handles the username/password login against `/ECM/api/login` and caches
//! the resulting bearer token until shortly before it expires.

use super::error::{ApiError, ApiResult};
use super::http::{sanitize_for_log, SaviyntHttpClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Token expiry buffer - refresh tokens this much before they actually expire
/// This prevents using tokens that are about to expire during a request
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Default token TTL if the login response carries no `expires_in` (30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Login credentials. `Debug` is implemented by hand so the password never
/// ends up in a log line.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    /// When this token expires (with buffer applied)
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Bearer token holder with caching
#[derive(Clone)]
pub struct TokenManager {
    login_url: String,
    credentials: Credentials,
    http: SaviyntHttpClient,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl TokenManager {
    pub fn new(login_url: String, credentials: Credentials, http: SaviyntHttpClient) -> Self {
        Self {
            login_url,
            credentials,
            http,
            token_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Get an access token for API calls, logging in when the cache is empty or stale
    pub async fn get_token(&self) -> ApiResult<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let (token, ttl) = self.login().await?;
        let expires_at = Instant::now() + ttl.saturating_sub(TOKEN_EXPIRY_BUFFER);

        {
            let mut cache = self.token_cache.write().await;
            *cache = Some(CachedToken {
                token: token.clone(),
                expires_at,
            });
        }

        tracing::debug!(
            "New token cached, expires in ~{} minutes",
            ttl.saturating_sub(TOKEN_EXPIRY_BUFFER).as_secs() / 60
        );

        Ok(token)
    }

    /// Drop the cached token so the next call logs in again
    pub async fn invalidate(&self) {
        let mut cache = self.token_cache.write().await;
        *cache = None;
    }

    async fn login(&self) -> ApiResult<(String, Duration)> {
        tracing::info!("Logging in to Saviynt as {}", self.credentials.username);

        let request = LoginRequest {
            username: &self.credentials.username,
            password: &self.credentials.password,
        };
        let reply = self.http.post_json(&self.login_url, None, &request).await?;

        if !reply.is_success() {
            return Err(ApiError::Auth(format!(
                "login returned {}: {}",
                reply.status,
                sanitize_for_log(&reply.body)
            )));
        }

        let response: LoginResponse = serde_json::from_str(&reply.body)?;
        let token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Auth("login response carried no access_token".to_string()))?;
        let ttl = response
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_TTL);

        Ok((token, ttl))
    }
}
