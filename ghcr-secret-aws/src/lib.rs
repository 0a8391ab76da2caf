#![deny(missing_docs)]
//! AWS backends for [`ghcr_secret`].
//!
//! [`AwsSecretsManagerStore`] implements [`SecretStore`] on top of
//! Secrets Manager `GetSecretValue`; [`AwsParameterStore`] implements
//! [`ParameterStore`] on top of SSM `GetParameter`. Both talk to the region
//! named by the reference, so a handler deployed in one region can read
//! secrets kept in another.
//!
//! Credentials come from the default provider chain (environment, profile,
//! container or instance role). SDK clients are built once per region and
//! reused for the lifetime of the store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use ghcr_protocol::Arn;
use ghcr_secret::{ParameterStore, SecretError, SecretStore, SecretValue};
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::RwLock;

/// SDK clients keyed by region.
struct RegionalClients<C> {
    clients: RwLock<HashMap<String, C>>,
}

impl<C: Clone> RegionalClients<C> {
    fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }

    async fn get<F, Fut>(&self, region: &str, build: F) -> C
    where
        F: FnOnce(aws_config::SdkConfig) -> Fut,
        Fut: Future<Output = C>,
    {
        if let Some(client) = self.clients.read().await.get(region) {
            return client.clone();
        }
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(region) {
            return client.clone();
        }
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if !region.is_empty() {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let client = build(loader.load().await).await;
        clients.insert(region.to_string(), client.clone());
        client
    }
}

/// Secrets Manager backed [`SecretStore`].
pub struct AwsSecretsManagerStore {
    clients: RegionalClients<aws_sdk_secretsmanager::Client>,
}

impl AwsSecretsManagerStore {
    /// Create a store using the default credential chain.
    pub fn new() -> Self {
        Self {
            clients: RegionalClients::new(),
        }
    }
}

impl Default for AwsSecretsManagerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AwsSecretsManagerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManagerStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretStore for AwsSecretsManagerStore {
    async fn get_secret_string(&self, arn: &Arn) -> Result<SecretValue, SecretError> {
        let client = self
            .clients
            .get(&arn.region, |config| async move {
                aws_sdk_secretsmanager::Client::new(&config)
            })
            .await;

        let output = client
            .get_secret_value()
            .secret_id(arn.to_string())
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                if service.is_resource_not_found_exception() {
                    SecretError::NotFound(arn.to_string())
                } else {
                    SecretError::Backend(format!(
                        "{}",
                        aws_sdk_secretsmanager::error::DisplayErrorContext(&service)
                    ))
                }
            })?;

        tracing::debug!(secret = %arn, "secret fetched");
        output
            .secret_string()
            .map(|s| SecretValue::new(s.to_string()))
            .ok_or_else(|| SecretError::NotFound(format!("{arn} has no string value")))
    }
}

/// SSM Parameter Store backed [`ParameterStore`].
pub struct AwsParameterStore {
    clients: RegionalClients<aws_sdk_ssm::Client>,
}

impl AwsParameterStore {
    /// Create a store using the default credential chain.
    pub fn new() -> Self {
        Self {
            clients: RegionalClients::new(),
        }
    }
}

impl Default for AwsParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AwsParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsParameterStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl ParameterStore for AwsParameterStore {
    async fn get_parameter(
        &self,
        region: &str,
        name: &str,
        with_decryption: bool,
    ) -> Result<SecretValue, SecretError> {
        let client = self
            .clients
            .get(region, |config| async move { aws_sdk_ssm::Client::new(&config) })
            .await;

        let output = client
            .get_parameter()
            .name(name)
            .with_decryption(with_decryption)
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                if service.is_parameter_not_found() {
                    SecretError::NotFound(name.to_string())
                } else {
                    SecretError::Backend(format!(
                        "{}",
                        aws_sdk_ssm::error::DisplayErrorContext(&service)
                    ))
                }
            })?;

        tracing::debug!(parameter = %name, region = %region, "parameter fetched");
        output
            .parameter()
            .and_then(|p| p.value())
            .map(|v| SecretValue::new(v.to_string()))
            .ok_or_else(|| SecretError::NotFound(format!("{name} has no value")))
    }
}
