//! Saviynt API error types
//!
//! Three failure channels reach callers: transport failures, non-success HTTP
//! statuses, and error codes embedded in an otherwise successful response body.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for Saviynt API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned by the Saviynt client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request unauthorized (401) after {attempts} attempt(s)")]
    Unauthorized { attempts: u32 },

    #[error("precondition failed (412): {message}")]
    PreconditionFailed { message: String },

    #[error("API request failed: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("vendor error code {code}: {message}")]
    Vendor { code: String, message: String },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Build an error from a non-success HTTP reply
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            StatusCode::PRECONDITION_FAILED => Self::PreconditionFailed { message },
            _ => Self::Status {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Check if error is transient (worth retrying with backoff)
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_timeout() || e.is_connect(),
            ApiError::Status { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// A 412 is reported to Terraform as a warning rather than a failure
    #[must_use]
    pub fn is_precondition_failed(&self) -> bool {
        matches!(self, ApiError::PreconditionFailed { .. })
    }
}

/// Pull a human readable message out of an error body.
/// Saviynt uses `msg` on most endpoints and `message` on a few.
fn extract_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.get("msg").or_else(|| v.get("message")))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| super::http::sanitize_for_log(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_412_maps_to_precondition_failed() {
        let err = ApiError::from_status(
            StatusCode::PRECONDITION_FAILED,
            r#"{"msg":"trigger already scheduled","errorCode":"1"}"#,
        );
        assert!(err.is_precondition_failed());
        assert_eq!(
            err.to_string(),
            "precondition failed (412): trigger already scheduled"
        );
    }

    #[test]
    fn test_server_errors_are_transient() {
        let err = ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(err.is_transient());

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "bad");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_message_falls_back_to_raw_body() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_vendor_error_is_not_transient() {
        let err = ApiError::Vendor {
            code: "1".to_string(),
            message: "Invalid job".to_string(),
        };
        assert!(!err.is_transient());
        assert!(!err.is_precondition_failed());
    }
}
