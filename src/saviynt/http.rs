//! HTTP utilities for Saviynt REST API calls

use super::error::ApiResult;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Raw HTTP reply, status left for the caller to classify
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
}

impl HttpReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Correlation id sent with every request and echoed in the logs
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// HTTP client wrapper for Saviynt API calls
#[derive(Clone)]
pub struct SaviyntHttpClient {
    client: Client,
}

impl SaviyntHttpClient {
    /// Create a new HTTP client
    pub fn new(timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(format!("terraform-provider-saviynt/{}", crate::VERSION))
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// POST a JSON body, optionally with a bearer token
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        token: Option<&str>,
        body: &B,
    ) -> ApiResult<HttpReply> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!("POST {} [{}]", url, request_id);

        let mut request = self
            .client
            .post(url)
            .header(REQUEST_ID_HEADER, &request_id)
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                "API error [{}]: {} - {}",
                request_id,
                status,
                sanitize_for_log(&body)
            );
        }

        Ok(HttpReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("[truncated, 500 bytes total]"));
    }

    #[test]
    fn test_sanitize_strips_control_characters() {
        assert_eq!(sanitize_for_log("line one\nline\ttwo"), "line onelinetwo");
    }

    #[test]
    fn test_sanitize_respects_char_boundaries() {
        let body = "é".repeat(150);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("[truncated, 300 bytes total]"));
    }
}
