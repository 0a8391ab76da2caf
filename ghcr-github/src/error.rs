//! Errors raised while talking to GitHub.

use ghcr_auth::AuthError;
use ghcr_crypto::CryptoError;
use ghcr_secret::SecretError;
use serde_json::Value;
use thiserror::Error;

/// A non-success response from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Human-readable message, the text suppression patterns match against.
    pub message: String,
}

impl ApiError {
    /// Build from a response status and body.
    ///
    /// The message is the body's `message`, followed by `": "` and the
    /// JSON-encoded `errors` entries joined by `", "` when there are any.
    /// Bodies without a `message` fall back to the status text.
    pub fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let base = parsed
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string);

        let message = match base {
            Some(mut message) => {
                let details: Vec<String> = parsed
                    .as_ref()
                    .and_then(|v| v.get("errors"))
                    .and_then(Value::as_array)
                    .map(|errors| errors.iter().map(Value::to_string).collect())
                    .unwrap_or_default();
                if !details.is_empty() {
                    message.push_str(": ");
                    message.push_str(&details.join(", "));
                }
                message
            }
            None => status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        };

        Self {
            status: status.as_u16(),
            message,
        }
    }
}

/// Errors from dispatching a call.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GitHubError {
    /// `endpoint.method` is not in the operation registry.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// GitHub answered with a non-success status.
    #[error("GitHub API error ({}): {}", .0.status, .0.message)]
    Api(#[from] ApiError),

    /// The plaintext of a secret write could not be resolved.
    #[error("secret resolution failed: {0}")]
    Secret(#[from] SecretError),

    /// Sealing a secret failed.
    #[error("encryption failed: {0}")]
    Crypto(#[from] CryptoError),

    /// Minting or exchanging credentials failed.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// The request never got a response (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Parameters do not fit the operation.
    #[error("invalid parameters for {operation}: {reason}")]
    InvalidParameters {
        /// `endpoint.method`.
        operation: String,
        /// What is wrong.
        reason: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response from {operation}: {reason}")]
    Decode {
        /// `endpoint.method`.
        operation: String,
        /// What is wrong.
        reason: String,
    },
}

impl GitHubError {
    /// The API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            GitHubError::Api(e) => Some(e),
            _ => None,
        }
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> GitHubError {
    if err.is_timeout() {
        tracing::warn!("request to GitHub timed out");
    }
    GitHubError::Transport(err)
}
