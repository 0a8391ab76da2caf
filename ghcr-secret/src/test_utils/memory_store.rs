//! MemoryStore: HashMap-backed SecretStore and ParameterStore for testing.

use crate::{ParameterStore, SecretError, SecretStore, SecretValue};
use async_trait::async_trait;
use ghcr_protocol::Arn;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory secret and parameter store.
///
/// Secrets are keyed by full ARN, parameters by `(region, name)`. Every
/// lookup is counted so tests can assert that nothing is cached.
#[derive(Default)]
pub struct MemoryStore {
    secrets: RwLock<HashMap<String, String>>,
    parameters: RwLock<HashMap<(String, String), String>>,
    secret_reads: AtomicUsize,
    parameter_reads: AtomicUsize,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a secret string.
    pub fn with_secret(self, arn: impl Into<String>, value: impl Into<String>) -> Self {
        self.put_secret(arn, value);
        self
    }

    /// Add or replace a parameter.
    pub fn with_parameter(
        self,
        region: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        if let Ok(mut parameters) = self.parameters.write() {
            parameters.insert((region.into(), name.into()), value.into());
        }
        self
    }

    /// Replace a secret in place (simulates rotation).
    pub fn put_secret(&self, arn: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut secrets) = self.secrets.write() {
            secrets.insert(arn.into(), value.into());
        }
    }

    /// Number of secret lookups served so far.
    pub fn secret_reads(&self) -> usize {
        self.secret_reads.load(Ordering::SeqCst)
    }

    /// Number of parameter lookups served so far.
    pub fn parameter_reads(&self) -> usize {
        self.parameter_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get_secret_string(&self, arn: &Arn) -> Result<SecretValue, SecretError> {
        self.secret_reads.fetch_add(1, Ordering::SeqCst);
        let secrets = self
            .secrets
            .read()
            .map_err(|e| SecretError::Backend(e.to_string()))?;
        secrets
            .get(&arn.to_string())
            .map(|v| SecretValue::new(v.clone()))
            .ok_or_else(|| SecretError::NotFound(arn.to_string()))
    }
}

#[async_trait]
impl ParameterStore for MemoryStore {
    async fn get_parameter(
        &self,
        region: &str,
        name: &str,
        _with_decryption: bool,
    ) -> Result<SecretValue, SecretError> {
        self.parameter_reads.fetch_add(1, Ordering::SeqCst);
        let parameters = self
            .parameters
            .read()
            .map_err(|e| SecretError::Backend(e.to_string()))?;
        parameters
            .get(&(region.to_string(), name.to_string()))
            .map(|v| SecretValue::new(v.clone()))
            .ok_or_else(|| SecretError::NotFound(format!("{region}:{name}")))
    }
}
