//! Handler configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GHCR_GITHUB_API_URL` | `https://api.github.com` |
//! | `GHCR_USER_AGENT` | `ghcr-handler/<version>` |
//! | `GHCR_HTTP_TIMEOUT_SECS` | `30` |
//! | `GHCR_LOG_FORMAT` | `json` (`json` or `text`) |

use ghcr_github::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use std::time::Duration;
use thiserror::Error;

/// Base URL of the GitHub API.
pub const ENV_GITHUB_API_URL: &str = "GHCR_GITHUB_API_URL";
/// `User-Agent` header.
pub const ENV_USER_AGENT: &str = "GHCR_USER_AGENT";
/// Per-request timeout in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "GHCR_HTTP_TIMEOUT_SECS";
/// Log output format.
pub const ENV_LOG_FORMAT: &str = "GHCR_LOG_FORMAT";

/// Configuration errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set to an unusable value.
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// What is wrong.
        reason: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable lines.
    Text,
}

/// Settings shared by every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// GitHub API base URL.
    pub github_api_url: String,
    /// `User-Agent` sent to GitHub.
    pub user_agent: String,
    /// Timeout applied to each HTTP request.
    pub http_timeout: Duration,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            github_api_url: DEFAULT_BASE_URL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            http_timeout: Duration::from_secs(30),
            log_format: LogFormat::Json,
        }
    }
}

impl HandlerConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset or blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_GITHUB_API_URL) {
            let parsed = reqwest::Url::parse(&url).map_err(|e| invalid(ENV_GITHUB_API_URL, &url, e))?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
                return Err(invalid(ENV_GITHUB_API_URL, &url, "expected an http(s) URL"));
            }
            config.github_api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(user_agent) = get(ENV_USER_AGENT) {
            config.user_agent = user_agent;
        }

        if let Some(secs) = get(ENV_HTTP_TIMEOUT_SECS) {
            let parsed: u64 = secs
                .trim()
                .parse()
                .map_err(|e| invalid(ENV_HTTP_TIMEOUT_SECS, &secs, e))?;
            if parsed == 0 {
                return Err(invalid(ENV_HTTP_TIMEOUT_SECS, &secs, "must be positive"));
            }
            config.http_timeout = Duration::from_secs(parsed);
        }

        if let Some(format) = get(ENV_LOG_FORMAT) {
            config.log_format = match format.trim().to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" => LogFormat::Text,
                _ => return Err(invalid(ENV_LOG_FORMAT, &format, "expected json or text")),
            };
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
