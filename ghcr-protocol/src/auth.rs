//! Authentication descriptor carried under `ResourceProperties.Auth`.

use serde::{Deserialize, Serialize};

/// How the handler authenticates against the GitHub API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthStrategy {
    /// GitHub App or installation authentication. The secret is a JSON
    /// credential bundle in Secrets Manager.
    #[serde(rename = "auth-app")]
    App,
    /// Personal access token, stored in SSM Parameter Store or Secrets Manager.
    #[serde(rename = "auth-token")]
    Token,
    /// Anonymous access. Unknown strategy strings also land here.
    #[serde(rename = "unauthenticated", other)]
    Unauthenticated,
}

impl AuthStrategy {
    /// Whether the strategy needs a stored credential.
    pub fn requires_secret(self) -> bool {
        !matches!(self, AuthStrategy::Unauthenticated)
    }
}

/// The `Auth` property of a lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthDescriptor {
    /// Which strategy to use.
    pub strategy: AuthStrategy,
    /// Secrets Manager secret ARN or SSM parameter ARN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl AuthDescriptor {
    /// App authentication backed by a Secrets Manager secret.
    pub fn app(secret_arn: impl Into<String>) -> Self {
        Self {
            strategy: AuthStrategy::App,
            secret: Some(secret_arn.into()),
        }
    }

    /// Token authentication backed by a parameter or secret.
    pub fn token(secret_arn: impl Into<String>) -> Self {
        Self {
            strategy: AuthStrategy::Token,
            secret: Some(secret_arn.into()),
        }
    }

    /// Anonymous access.
    pub fn unauthenticated() -> Self {
        Self {
            strategy: AuthStrategy::Unauthenticated,
            secret: None,
        }
    }
}
