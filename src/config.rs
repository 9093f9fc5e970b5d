//! Configuration Management
//!
//! Resolves the provider settings from the Terraform provider block, the
//! environment and an optional config file, in that order of precedence.

use crate::saviynt::auth::Credentials;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const ENV_URL: &str = "SAVIYNT_URL";
pub const ENV_USERNAME: &str = "SAVIYNT_USERNAME";
pub const ENV_PASSWORD: &str = "SAVIYNT_PASSWORD";
pub const ENV_MAX_RETRIES: &str = "SAVIYNT_MAX_RETRIES";
pub const ENV_REQUEST_TIMEOUT: &str = "SAVIYNT_REQUEST_TIMEOUT";

/// Origin label for values set in the provider block
pub const PROVIDER_BLOCK: &str = "the provider block";
const CONFIG_FILE: &str = "the config file";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Retry policy for the authenticated call wrapper
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Backoff before the given retry (1-based), capped at `max_backoff_ms`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = delay.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Policy with no sleeping between attempts, for tests
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            backoff_multiplier: 1.0,
        }
    }
}

/// Optional defaults stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("terraform-provider-saviynt").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config file {:?}: {:#}", path, e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).context("Failed to parse config JSON")
    }
}

/// Values set in the Terraform `provider "saviynt"` block
#[derive(Debug, Clone, Default)]
pub struct ProviderOverrides {
    pub server_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_retries: Option<i64>,
    pub request_timeout_secs: Option<i64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing `{attribute}`: set it in the provider block or via {env}")]
    Missing {
        attribute: &'static str,
        env: &'static str,
    },

    #[error("invalid server_url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid `{attribute}` {value:?} from {origin}: expected {expected}")]
    InvalidNumber {
        attribute: &'static str,
        origin: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl ConfigError {
    /// Name of the provider attribute the error relates to
    pub fn attribute(&self) -> &'static str {
        match self {
            ConfigError::Missing { attribute, .. } => *attribute,
            ConfigError::InvalidUrl { .. } => "server_url",
            ConfigError::InvalidNumber { attribute, .. } => *attribute,
        }
    }
}

/// Fully resolved provider settings
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: Url,
    pub credentials: Credentials,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

impl ProviderSettings {
    /// Resolve settings (provider block > environment > config file > defaults)
    pub fn resolve(overrides: ProviderOverrides, file: &FileConfig) -> Result<Self, ConfigError> {
        Self::resolve_with(overrides, file, |key| std::env::var(key).ok())
    }

    /// Same as [`resolve`](Self::resolve) with an injectable environment lookup
    pub fn resolve_with(
        overrides: ProviderOverrides,
        file: &FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let server_url = non_empty(overrides.server_url)
            .or_else(|| non_empty(env(ENV_URL)))
            .or_else(|| non_empty(file.server_url.clone()))
            .ok_or(ConfigError::Missing {
                attribute: "server_url",
                env: ENV_URL,
            })?;
        let username = non_empty(overrides.username)
            .or_else(|| non_empty(env(ENV_USERNAME)))
            .or_else(|| non_empty(file.username.clone()))
            .ok_or(ConfigError::Missing {
                attribute: "username",
                env: ENV_USERNAME,
            })?;
        // Security: passwords are never read from the config file
        let password = non_empty(overrides.password)
            .or_else(|| non_empty(env(ENV_PASSWORD)))
            .ok_or(ConfigError::Missing {
                attribute: "password",
                env: ENV_PASSWORD,
            })?;

        let max_retries = match overrides.max_retries {
            Some(n) => Some(max_retries_setting(n, PROVIDER_BLOCK)?),
            None => match env_setting(&env, ENV_MAX_RETRIES, "max_retries")? {
                Some(raw) => Some(max_retries_setting(raw, ENV_MAX_RETRIES)?),
                None => file.max_retries,
            },
        };

        let timeout_secs = match overrides.request_timeout_secs {
            Some(n) => timeout_setting(n, PROVIDER_BLOCK)?,
            None => match env_setting(&env, ENV_REQUEST_TIMEOUT, "request_timeout_secs")? {
                Some(raw) => timeout_setting(raw, ENV_REQUEST_TIMEOUT)?,
                None => match file.request_timeout_secs {
                    Some(n) => timeout_setting(n, CONFIG_FILE)?,
                    None => DEFAULT_REQUEST_TIMEOUT_SECS,
                },
            },
        };

        let mut retry = RetryPolicy::default();
        if let Some(n) = max_retries {
            retry.max_retries = n;
        }

        Ok(Self {
            base_url: normalize_base_url(&server_url)?,
            credentials: Credentials { username, password },
            retry,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Retry count, which must fit a `u32`
pub fn max_retries_setting<T>(value: T, origin: &'static str) -> Result<u32, ConfigError>
where
    T: Copy + ToString,
    u32: TryFrom<T>,
{
    u32::try_from(value).map_err(|_| ConfigError::InvalidNumber {
        attribute: "max_retries",
        origin,
        value: value.to_string(),
        expected: "an integer between 0 and 4294967295",
    })
}

/// Request timeout in seconds; zero would fail every call
pub fn timeout_setting<T>(value: T, origin: &'static str) -> Result<u64, ConfigError>
where
    T: Copy + ToString,
    u64: TryFrom<T>,
{
    match u64::try_from(value) {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidNumber {
            attribute: "request_timeout_secs",
            origin,
            value: value.to_string(),
            expected: "a positive number of seconds",
        }),
    }
}

/// Integer from the environment; range checks are left to the caller
fn env_setting(
    env: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    attribute: &'static str,
) -> Result<Option<i128>, ConfigError> {
    match env(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<i128>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                attribute,
                origin: key,
                value,
                expected: "an integer",
            }),
    }
}

/// Parse the server URL and make sure joins append to its path
pub fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(&format!("{trimmed}/")).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_provider_block_wins_over_environment() {
        let overrides = ProviderOverrides {
            server_url: Some("https://tenant.saviyntcloud.com".to_string()),
            username: Some("admin".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        };
        let env = env_from(&[(ENV_URL, "https://other.example.com"), (ENV_USERNAME, "other")]);

        let settings =
            ProviderSettings::resolve_with(overrides, &FileConfig::default(), env).unwrap();
        assert_eq!(settings.base_url.as_str(), "https://tenant.saviyntcloud.com/");
        assert_eq!(settings.credentials.username, "admin");
        assert_eq!(settings.retry, RetryPolicy::default());
    }

    #[test]
    fn test_environment_then_file_fallback() {
        let file = FileConfig {
            server_url: Some("https://file.example.com/".to_string()),
            username: Some("file-user".to_string()),
            max_retries: Some(7),
            request_timeout_secs: Some(15),
        };
        let env = env_from(&[(ENV_PASSWORD, "pw"), (ENV_USERNAME, "env-user")]);

        let settings =
            ProviderSettings::resolve_with(ProviderOverrides::default(), &file, env).unwrap();
        assert_eq!(settings.base_url.as_str(), "https://file.example.com/");
        assert_eq!(settings.credentials.username, "env-user");
        assert_eq!(settings.retry.max_retries, 7);
        assert_eq!(settings.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_missing_password_names_attribute_and_env() {
        let env = env_from(&[(ENV_URL, "https://x.example.com"), (ENV_USERNAME, "u")]);
        let err = ProviderSettings::resolve_with(ProviderOverrides::default(), &FileConfig::default(), env)
            .unwrap_err();
        assert_eq!(err.attribute(), "password");
        assert!(err.to_string().contains(ENV_PASSWORD));
    }

    #[test]
    fn test_password_is_never_taken_from_file() {
        let file = FileConfig {
            server_url: Some("https://file.example.com".to_string()),
            username: Some("u".to_string()),
            ..Default::default()
        };
        let err = ProviderSettings::resolve_with(ProviderOverrides::default(), &file, env_from(&[]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                attribute: "password",
                env: ENV_PASSWORD
            }
        );
    }

    #[test]
    fn test_invalid_retry_env_is_rejected() {
        let env = env_from(&[
            (ENV_URL, "https://x.example.com"),
            (ENV_USERNAME, "u"),
            (ENV_PASSWORD, "p"),
            (ENV_MAX_RETRIES, "many"),
        ]);
        let err = ProviderSettings::resolve_with(ProviderOverrides::default(), &FileConfig::default(), env)
            .unwrap_err();
        assert_eq!(err.attribute(), "max_retries");
    }

    fn required_env(extra: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let mut pairs = vec![
            (ENV_URL, "https://x.example.com"),
            (ENV_USERNAME, "u"),
            (ENV_PASSWORD, "p"),
        ];
        pairs.extend_from_slice(extra);
        env_from(&pairs)
    }

    #[test]
    fn test_retry_env_overflow_is_rejected() {
        let env = required_env(&[(ENV_MAX_RETRIES, "4294967296")]);
        let err = ProviderSettings::resolve_with(ProviderOverrides::default(), &FileConfig::default(), env)
            .unwrap_err();
        assert_eq!(err.attribute(), "max_retries");
        assert!(err.to_string().contains(ENV_MAX_RETRIES));
    }

    #[test]
    fn test_retry_override_overflow_is_rejected() {
        let overrides = ProviderOverrides {
            max_retries: Some(5_000_000_000),
            ..Default::default()
        };
        let err = ProviderSettings::resolve_with(overrides, &FileConfig::default(), required_env(&[]))
            .unwrap_err();
        assert_eq!(err.attribute(), "max_retries");
        assert!(err.to_string().contains("5000000000"));
    }

    #[test]
    fn test_zero_timeout_is_rejected_from_every_source() {
        let from_env = ProviderSettings::resolve_with(
            ProviderOverrides::default(),
            &FileConfig::default(),
            required_env(&[(ENV_REQUEST_TIMEOUT, "0")]),
        );
        let from_block = ProviderSettings::resolve_with(
            ProviderOverrides {
                request_timeout_secs: Some(0),
                ..Default::default()
            },
            &FileConfig::default(),
            required_env(&[]),
        );
        let from_file = ProviderSettings::resolve_with(
            ProviderOverrides::default(),
            &FileConfig {
                request_timeout_secs: Some(0),
                ..Default::default()
            },
            required_env(&[]),
        );

        for result in [from_env, from_block, from_file] {
            assert_eq!(result.unwrap_err().attribute(), "request_timeout_secs");
        }
    }

    #[test]
    fn test_numeric_settings_accept_bounds() {
        assert_eq!(max_retries_setting(0i64, PROVIDER_BLOCK), Ok(0));
        assert_eq!(max_retries_setting(4_294_967_295i64, PROVIDER_BLOCK), Ok(u32::MAX));
        assert!(max_retries_setting(-1i64, PROVIDER_BLOCK).is_err());
        assert_eq!(timeout_setting(1i64, PROVIDER_BLOCK), Ok(1));
        assert!(timeout_setting(-30i64, PROVIDER_BLOCK).is_err());
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://tenant.saviyntcloud.com///").unwrap().as_str(),
            "https://tenant.saviyntcloud.com/"
        );
        assert_eq!(
            normalize_base_url("http://localhost:8080/proxy").unwrap().as_str(),
            "http://localhost:8080/proxy/"
        );
        assert!(normalize_base_url("ftp://tenant.example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(3), Duration::from_millis(800));
        assert_eq!(policy.backoff(10), Duration::from_millis(5000));
        assert_eq!(RetryPolicy::immediate(3).backoff(4), Duration::ZERO);
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("saviynt-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"server_url":"https://a.example.com","max_retries":1}"#).unwrap();

        let config = FileConfig::load_from(&path).unwrap();
        assert_eq!(config.server_url.as_deref(), Some("https://a.example.com"));
        assert_eq!(config.max_retries, Some(1));
        assert!(config.username.is_none());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
