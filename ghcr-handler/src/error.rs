//! Handler-level error aggregation.

use crate::config::ConfigError;
use ghcr_auth::AuthError;
use ghcr_github::GitHubError;
use ghcr_protocol::ParseError;
use thiserror::Error;

/// Everything that can fail a lifecycle request.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The event or its call descriptor is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Credentials could not be resolved.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The GitHub call failed and was not suppressed.
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP client could not be built.
    #[error("http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The result could not be encoded as JSON.
    #[error("encoding result: {0}")]
    Encode(#[source] serde_json::Error),
}
