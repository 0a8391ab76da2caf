//! Reconciliation Handler.
//!
//! One lifecycle request runs
//! `parse descriptor -> resolve auth -> dispatch -> normalize -> result`.
//! A phase without a descriptor is a no-op. A failed dispatch is either
//! suppressed (the descriptor's pattern matches the API error) or returned.

use crate::classify::should_suppress;
use crate::config::HandlerConfig;
use crate::error::HandlerError;
use crate::normalize::{MAX_OUTPUT_BYTES, NormalizedResponse, flatten, physical_resource_id};
use ghcr_auth::resolve_auth;
use ghcr_crypto::{Sealer, SodiumSealer};
use ghcr_github::{CallDispatcher, GitHubClient, OperationRegistry};
use ghcr_protocol::{LifecycleEvent, LifecycleResult};
use ghcr_secret::SecretResolver;
use serde_json::{Value, json};
use std::sync::Arc;

/// Handles lifecycle requests for GitHub custom resources.
///
/// Holds only immutable state: configuration, the secret resolver, the
/// sealer and the operation registry. Credentials and the GitHub client are
/// built per request.
pub struct ReconciliationHandler {
    config: HandlerConfig,
    secrets: SecretResolver,
    sealer: Arc<dyn Sealer>,
    registry: Arc<OperationRegistry>,
    http: reqwest::Client,
}

impl ReconciliationHandler {
    /// Create a handler with the sodium sealer and the default operations.
    pub fn new(config: HandlerConfig, secrets: SecretResolver) -> Result<Self, HandlerError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(HandlerError::HttpClient)?;
        Ok(Self {
            config,
            secrets,
            sealer: Arc::new(SodiumSealer::new()),
            registry: Arc::new(OperationRegistry::with_defaults()),
            http,
        })
    }

    /// Replace the sealer.
    #[must_use]
    pub fn with_sealer(mut self, sealer: Arc<dyn Sealer>) -> Self {
        self.sealer = sealer;
        self
    }

    /// Replace the operation registry.
    #[must_use]
    pub fn with_registry(mut self, registry: OperationRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Handle one lifecycle request.
    ///
    /// `Ok(None)` means there was nothing to report: no call for this phase,
    /// or a suppressed API error.
    pub async fn handle(
        &self,
        event: &LifecycleEvent,
    ) -> Result<Option<LifecycleResult>, HandlerError> {
        tracing::info!(
            request_type = %event.request_type,
            logical_resource_id = event.logical_resource_id.as_deref().unwrap_or_default(),
            resource_type = event.resource_type.as_deref().unwrap_or_default(),
            "lifecycle request received"
        );

        let Some(call) = event.descriptor()? else {
            tracing::info!(request_type = %event.request_type, "no call for this phase");
            return Ok(None);
        };

        let auth = resolve_auth(&event.resource_properties.auth, &self.secrets).await?;
        let client = GitHubClient::new(auth)
            .base_url(self.config.github_api_url.as_str())
            .user_agent(self.config.user_agent.as_str())
            .http_client(self.http.clone());
        let dispatcher = CallDispatcher::new(
            client,
            self.registry.clone(),
            self.secrets.clone(),
            self.sealer.clone(),
        );

        let response = match dispatcher.execute(&call).await {
            Ok(response) => response,
            Err(err) if should_suppress(&call, &err) => {
                tracing::warn!(
                    operation = %call.operation(),
                    error = %err,
                    "ignoring error matching ignoreErrorCodesMatching"
                );
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(operation = %call.operation(), status = response.status, "call succeeded");

        let flattened = flatten(&response.data);
        let physical_id =
            physical_resource_id(call.physical_resource_id.as_ref(), &flattened, event);
        let normalized =
            NormalizedResponse::new(response.status, flattened, call.output_paths.as_deref());

        let result = LifecycleResult {
            physical_resource_id: physical_id,
            data: Some(normalized.into_data()),
        };
        let size = result.encoded_len();
        if size > MAX_OUTPUT_BYTES {
            tracing::warn!(
                size,
                limit = MAX_OUTPUT_BYTES,
                "result exceeds the provider response limit; narrow outputPaths"
            );
        }
        tracing::info!(
            physical_resource_id = result.physical_resource_id.as_deref().unwrap_or_default(),
            "lifecycle request completed"
        );
        Ok(Some(result))
    }

    /// Handle a raw JSON event and produce the raw JSON answer; a `None`
    /// result becomes `{}`.
    pub async fn handle_payload(&self, payload: Value) -> Result<Value, HandlerError> {
        let event = LifecycleEvent::from_value(payload)?;
        Ok(match self.handle(&event).await? {
            Some(result) => serde_json::to_value(result).map_err(HandlerError::Encode)?,
            None => json!({}),
        })
    }
}

impl std::fmt::Debug for ReconciliationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationHandler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
