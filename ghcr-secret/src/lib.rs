#![deny(missing_docs)]
//! Secret resolution for ghcr.
//!
//! This crate defines the [`SecretStore`] and [`ParameterStore`] backend
//! traits, the [`SecretValue`] in-memory wrapper (no Serialize, no Display,
//! no Clone, memory zeroed on drop), and the [`SecretResolver`] that turns a
//! [`SecretLocator`] into a plaintext value.
//!
//! ## Design
//!
//! - Backends fetch raw strings. Field extraction, ARN handling and error
//!   classification live in [`SecretResolver`], so every backend behaves the same.
//! - Nothing is cached. Secrets may rotate between a Create and the next
//!   Update; each resolution goes back to the store.
//! - [`SecretValue`] uses scoped exposure (`with_str`) to prevent accidental leaks.

use async_trait::async_trait;
use ghcr_protocol::{Arn, SecretLocator};
use std::sync::Arc;
use thiserror::Error;
use zeroize::Zeroizing;

#[cfg(feature = "test-utils")]
pub mod test_utils;

/// Errors from secret resolution.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SecretError {
    /// The store lookup failed or the secret has no string value.
    #[error("secret not found: {0}")]
    NotFound(String),

    /// A field was requested but could not be extracted.
    #[error("secret field {field:?} unavailable in {reference}: {reason}")]
    Field {
        /// The secret reference.
        reference: String,
        /// The requested field.
        field: String,
        /// Why extraction failed.
        reason: String,
    },

    /// The reference is not a usable ARN.
    #[error("invalid secret reference: {0}")]
    InvalidReference(String),

    /// Backend communication failure (network, throttling, permissions).
    #[error("backend error: {0}")]
    Backend(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// An opaque secret string. Cannot be logged, serialized, or cloned.
/// Memory is zeroed on drop via [`Zeroizing`].
pub struct SecretValue {
    inner: Zeroizing<String>,
}

impl SecretValue {
    /// Wrap a plaintext. The string is moved, not copied.
    pub fn new(value: String) -> Self {
        Self {
            inner: Zeroizing::new(value),
        }
    }

    /// Scoped exposure as a string slice.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        f(&self.inner)
    }

    /// Scoped exposure as bytes.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.inner.as_bytes())
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for SecretValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// A key-value secret store addressed by ARN (AWS Secrets Manager).
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the secret string. The store's region is taken from the ARN.
    async fn get_secret_string(&self, arn: &Arn) -> Result<SecretValue, SecretError>;
}

/// A hierarchical parameter store (AWS SSM Parameter Store).
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch a parameter by name in `region`, decrypting SecureStrings when asked.
    async fn get_parameter(
        &self,
        region: &str,
        name: &str,
        with_decryption: bool,
    ) -> Result<SecretValue, SecretError>;
}

/// Resolves [`SecretLocator`]s against the configured stores.
#[derive(Clone)]
pub struct SecretResolver {
    secrets: Arc<dyn SecretStore>,
    parameters: Arc<dyn ParameterStore>,
}

impl SecretResolver {
    /// Create a resolver over the given backends.
    pub fn new(secrets: Arc<dyn SecretStore>, parameters: Arc<dyn ParameterStore>) -> Self {
        Self {
            secrets,
            parameters,
        }
    }

    /// Resolve a locator: the whole secret string, or one JSON field of it.
    pub async fn resolve(&self, locator: &SecretLocator) -> Result<SecretValue, SecretError> {
        let raw = self.resolve_arn(&locator.arn).await?;
        match &locator.field {
            None => Ok(raw),
            Some(field) => raw.with_str(|s| extract_field(&locator.arn, s, field)),
        }
    }

    /// Resolve a whole secret by ARN.
    pub async fn resolve_arn(&self, reference: &str) -> Result<SecretValue, SecretError> {
        let arn = Arn::parse(reference)
            .map_err(|_| SecretError::InvalidReference(reference.to_string()))?;
        tracing::debug!(secret = %reference, region = %arn.region, "fetching secret");
        self.secrets.get_secret_string(&arn).await
    }

    /// Resolve an SSM parameter ARN with decryption.
    ///
    /// The parameter name is the ARN resource without its `parameter` prefix.
    pub async fn resolve_parameter(&self, reference: &str) -> Result<SecretValue, SecretError> {
        let arn = Arn::parse(reference)
            .map_err(|_| SecretError::InvalidReference(reference.to_string()))?;
        let name = arn
            .ssm_parameter_name()
            .ok_or_else(|| SecretError::InvalidReference(reference.to_string()))?;
        tracing::debug!(parameter = %name, region = %arn.region, "fetching parameter");
        self.parameters.get_parameter(&arn.region, &name, true).await
    }
}

fn extract_field(reference: &str, raw: &str, field: &str) -> Result<SecretValue, SecretError> {
    let field_error = |reason: String| SecretError::Field {
        reference: reference.to_string(),
        field: field.to_string(),
        reason,
    };
    let parsed: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| field_error(format!("not JSON: {e}")))?;
    let object = parsed
        .as_object()
        .ok_or_else(|| field_error("not a JSON object".into()))?;
    match object.get(field) {
        None | Some(serde_json::Value::Null) => Err(field_error("field is absent".into())),
        Some(serde_json::Value::String(s)) => Ok(SecretValue::new(s.clone())),
        Some(other) => Ok(SecretValue::new(other.to_string())),
    }
}
