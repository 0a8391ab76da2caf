//! Call Dispatcher: executes one [`ApiCallDescriptor`].

use crate::client::{ApiResponse, GitHubClient};
use crate::error::GitHubError;
use crate::operation::{Operation, OperationRegistry};
use ghcr_crypto::Sealer;
use ghcr_protocol::{ApiCallDescriptor, CallParameters, SecretWriteParameters};
use ghcr_secret::SecretResolver;
use serde::Deserialize;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Public key of a secret scope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScopePublicKey {
    /// Id to send back with the sealed value.
    pub key_id: String,
    /// Base64 X25519 public key.
    pub key: String,
}

/// Executes described calls against GitHub.
///
/// Generic calls go straight to the registry operation. The three
/// secret-write operations run a fixed sequence instead: fetch the scope's
/// public key, resolve the plaintext, seal it, then write. The plaintext is
/// never sent.
pub struct CallDispatcher {
    client: GitHubClient,
    registry: Arc<OperationRegistry>,
    secrets: SecretResolver,
    sealer: Arc<dyn Sealer>,
}

impl CallDispatcher {
    /// Create a dispatcher.
    pub fn new(
        client: GitHubClient,
        registry: Arc<OperationRegistry>,
        secrets: SecretResolver,
        sealer: Arc<dyn Sealer>,
    ) -> Self {
        Self {
            client,
            registry,
            secrets,
            sealer,
        }
    }

    /// The underlying client.
    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    fn operation(&self, endpoint: &str, method: &str) -> Result<&Operation, GitHubError> {
        self.registry
            .get(endpoint, method)
            .ok_or_else(|| GitHubError::UnknownOperation(format!("{endpoint}.{method}")))
    }

    /// Execute `call` and return the raw response.
    pub async fn execute(&self, call: &ApiCallDescriptor) -> Result<ApiResponse, GitHubError> {
        let operation = self.operation(&call.endpoint, &call.method)?;
        match &call.parameters {
            CallParameters::Generic(params) => {
                tracing::info!(operation = %operation.name(), "dispatching GitHub call");
                self.client.send(operation, params).await
            }
            CallParameters::SecretWrite(params) => self.write_secret(operation, params).await,
        }
    }

    async fn write_secret(
        &self,
        write: &Operation,
        params: &SecretWriteParameters,
    ) -> Result<ApiResponse, GitHubError> {
        let scope = params.scope();
        let public_key_op = self.operation(write.endpoint, scope.public_key_method())?;
        tracing::info!(
            operation = %write.name(),
            secret = %params.secret_name(),
            "writing encrypted secret"
        );

        let key_response = self
            .client
            .send(public_key_op, &params.scope_parameters())
            .await?;
        let key: ScopePublicKey =
            serde_json::from_value(key_response.data).map_err(|e| GitHubError::Decode {
                operation: public_key_op.name(),
                reason: e.to_string(),
            })?;

        let plaintext = self.secrets.resolve(params.locator()).await?;
        let bytes = Zeroizing::new(plaintext.with_bytes(<[u8]>::to_vec));
        drop(plaintext);
        let encrypted_value = self.sealer.seal(&bytes, &key.key).await?;
        tracing::debug!(key_id = %key.key_id, "secret sealed");

        self.client
            .send(write, &params.sealed_parameters(&encrypted_value, &key.key_id))
            .await
    }
}

impl std::fmt::Debug for CallDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallDispatcher")
            .field("client", &self.client)
            .field("operations", &self.registry.len())
            .finish_non_exhaustive()
    }
}
