use ghcr_handler::{HandlerConfig, ReconciliationHandler, telemetry};
use ghcr_secret::SecretResolver;
use ghcr_secret_aws::{AwsParameterStore, AwsSecretsManagerStore};
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = HandlerConfig::from_env()?;
    telemetry::init(config.log_format)?;

    let secrets = SecretResolver::new(
        Arc::new(AwsSecretsManagerStore::new()),
        Arc::new(AwsParameterStore::new()),
    );
    let handler = Arc::new(ReconciliationHandler::new(config, secrets)?);
    tracing::info!(config = ?handler.config(), "ghcr handler starting");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = handler.clone();
        async move {
            let (payload, context) = event.into_parts();
            tracing::debug!(aws_request_id = %context.request_id, "invocation");
            handler.handle_payload(payload).await.map_err(Error::from)
        }
    }))
    .await
}
