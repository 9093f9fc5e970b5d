//! Saviynt Client
//!
//! Main client for interacting with the Saviynt EIC REST API, combining
//! authentication, HTTP transport and the retry policy.

use super::auth::TokenManager;
use super::error::{ApiError, ApiResult};
use super::http::{sanitize_for_log, SaviyntHttpClient};
use crate::config::{ProviderSettings, RetryPolicy};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

pub const LOGIN_PATH: &str = "ECM/api/login";

/// Responses that can carry an error inside a 2xx body
pub trait VendorStatus {
    /// `Some((code, message))` when the body reports a failure
    fn vendor_error(&self) -> Option<(String, String)>;
}

/// Interpret Saviynt's `errorCode` field, which arrives as a string or a number.
/// Anything other than zero, an empty string or an absent field is a failure.
pub fn vendor_error_code(code: Option<&Value>, message: Option<&str>) -> Option<(String, String)> {
    let code = match code? {
        Value::Null => return None,
        Value::String(s) if s.trim().is_empty() || s.trim() == "0" => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) if n.as_i64() == Some(0) => return None,
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    };
    let message = message.unwrap_or("no message returned").to_string();
    Some((code, message))
}

/// Main Saviynt client
#[derive(Clone)]
pub struct SaviyntClient {
    base_url: Url,
    http: SaviyntHttpClient,
    auth: TokenManager,
    retry: RetryPolicy,
}

impl SaviyntClient {
    /// Create a new client from resolved settings. No network call is made
    /// until the first request.
    pub fn new(settings: &ProviderSettings) -> ApiResult<Self> {
        let http = SaviyntHttpClient::new(settings.request_timeout)?;
        let login_url = settings.base_url.join(LOGIN_PATH)?.to_string();
        let auth = TokenManager::new(login_url, settings.credentials.clone(), http.clone());

        Ok(Self {
            base_url: settings.base_url.clone(),
            http,
            auth,
            retry: settings.retry.clone(),
        })
    }

    /// Build an API URL below the configured server
    pub fn api_url(&self, path: &str) -> ApiResult<String> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?.to_string())
    }

    /// POST `body` to `path` with a bearer token.
    ///
    /// - 401 drops the cached token, logs in again and retries; the first
    ///   refresh is always allowed, even with a zero retry budget
    /// - 429/502/503/504 and connect/timeout failures are retried with backoff
    /// - 412 and every other status are returned without retrying
    /// - a non-zero `errorCode` in a 2xx body becomes [`ApiError::Vendor`]
    pub async fn authenticated_call_with_retry<B, R>(&self, path: &str, body: &B) -> ApiResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned + VendorStatus,
    {
        let url = self.api_url(path)?;
        let mut attempt: u32 = 0;
        let mut refreshed = false;

        loop {
            attempt += 1;
            let retries_left = attempt <= self.retry.max_retries;

            let token = self.auth.get_token().await?;
            let err = match self.http.post_json(&url, Some(&token), body).await {
                Ok(reply) if reply.status == StatusCode::UNAUTHORIZED => {
                    if retries_left || !refreshed {
                        refreshed = true;
                        tracing::warn!(
                            url = %url,
                            attempt = attempt,
                            "Unauthorized (401), refreshing token and retrying"
                        );
                        self.auth.invalidate().await;
                        continue;
                    }
                    ApiError::Unauthorized { attempts: attempt }
                }
                Ok(reply) if reply.is_success() => return parse_reply(&reply.body),
                Ok(reply) => ApiError::from_status(reply.status, &reply.body),
                Err(e) => e,
            };

            if err.is_transient() && retries_left {
                let backoff = self.retry.backoff(attempt);
                tracing::warn!(
                    url = %url,
                    error = %err,
                    attempt = attempt,
                    wait_ms = backoff.as_millis() as u64,
                    "Transient error, retrying with backoff"
                );
                tokio::time::sleep(backoff).await;
                continue;
            }

            return Err(err);
        }
    }
}

fn parse_reply<R: DeserializeOwned + VendorStatus>(body: &str) -> ApiResult<R> {
    // Some endpoints answer 200 with an empty body
    let body = if body.trim().is_empty() { "{}" } else { body };
    let response: R = serde_json::from_str(body).map_err(|e| {
        tracing::error!("Unexpected response body: {}", sanitize_for_log(body));
        ApiError::Decode(e)
    })?;

    if let Some((code, message)) = response.vendor_error() {
        return Err(ApiError::Vendor { code, message });
    }

    Ok(response)
}
