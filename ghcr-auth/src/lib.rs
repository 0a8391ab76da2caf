#![deny(missing_docs)]
//! GitHub authentication strategies for ghcr.
//!
//! [`resolve_auth`] turns an [`AuthDescriptor`] into a [`ClientAuth`], the
//! credential the GitHub client attaches to every request:
//!
//! | Strategy | Secret | Result |
//! |----------|--------|--------|
//! | `auth-app` | Secrets Manager JSON bundle | [`ClientAuth::App`] |
//! | `auth-token` | SSM parameter or Secrets Manager secret | [`ClientAuth::Token`] |
//! | `unauthenticated` | none | [`ClientAuth::Unauthenticated`] |
//!
//! Credentials are resolved fresh for every invocation; nothing here caches.

mod app;

pub use app::{AppCredentials, JWT_CLOCK_SKEW, JWT_LIFETIME};

use ghcr_protocol::{Arn, AuthDescriptor, AuthStrategy};
use ghcr_secret::{SecretError, SecretResolver, SecretValue};
use thiserror::Error;

/// Errors from resolving authentication.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AuthError {
    /// The strategy needs a secret reference and none was given.
    #[error("auth strategy {strategy:?} requires a secret reference")]
    MissingSecret {
        /// The strategy that was requested.
        strategy: AuthStrategy,
    },

    /// The stored credential could not be used.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The credential could not be fetched.
    #[error("credential lookup failed: {0}")]
    Secret(#[from] SecretError),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A resolved GitHub credential.
pub enum ClientAuth {
    /// GitHub App, optionally acting as one installation.
    App(AppCredentials),
    /// Personal access or fine-grained token.
    Token(SecretValue),
    /// No credential.
    Unauthenticated,
}

impl ClientAuth {
    /// The strategy this credential belongs to.
    pub fn strategy(&self) -> AuthStrategy {
        match self {
            ClientAuth::App(_) => AuthStrategy::App,
            ClientAuth::Token(_) => AuthStrategy::Token,
            ClientAuth::Unauthenticated => AuthStrategy::Unauthenticated,
        }
    }
}

impl std::fmt::Debug for ClientAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientAuth::App(creds) => f.debug_tuple("App").field(creds).finish(),
            ClientAuth::Token(_) => f.write_str("Token([REDACTED])"),
            ClientAuth::Unauthenticated => f.write_str("Unauthenticated"),
        }
    }
}

/// Resolve the credential described by `descriptor`.
pub async fn resolve_auth(
    descriptor: &AuthDescriptor,
    secrets: &SecretResolver,
) -> Result<ClientAuth, AuthError> {
    let strategy = descriptor.strategy;
    if !strategy.requires_secret() {
        tracing::debug!("using unauthenticated github access");
        return Ok(ClientAuth::Unauthenticated);
    }

    let reference = descriptor
        .secret
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::MissingSecret { strategy })?;

    match strategy {
        AuthStrategy::App => {
            let raw = secrets.resolve_arn(reference).await?;
            let creds = raw.with_str(AppCredentials::from_json)?;
            tracing::debug!(
                app_id = creds.app_id,
                installation = ?creds.installation_id,
                "resolved github app credentials"
            );
            Ok(ClientAuth::App(creds))
        }
        AuthStrategy::Token => {
            let is_parameter = Arn::parse(reference)
                .map(|arn| arn.is_ssm_parameter())
                .unwrap_or(false);
            let token = if is_parameter {
                secrets.resolve_parameter(reference).await?
            } else {
                secrets.resolve_arn(reference).await?
            };
            if token.is_empty() {
                return Err(AuthError::InvalidCredentials("token is empty".into()));
            }
            tracing::debug!(source = %reference, "resolved github token");
            Ok(ClientAuth::Token(token))
        }
        AuthStrategy::Unauthenticated => Ok(ClientAuth::Unauthenticated),
    }
}
