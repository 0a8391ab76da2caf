//! End-to-end handler tests against a mock GitHub API.

use ghcr_handler::{HandlerConfig, HandlerError, MAX_OUTPUT_BYTES, ReconciliationHandler};
use ghcr_protocol::{AuthDescriptor, LifecycleEvent, RequestType, ResourceProperties};
use ghcr_secret::SecretResolver;
use ghcr_secret::test_utils::MemoryStore;
use serde_json::{Value, json};
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PARAMETER: &str = "arn:aws:ssm:eu-west-1:123456789012:parameter/github/token";

fn handler(server: &MockServer) -> (ReconciliationHandler, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new().with_parameter("eu-west-1", "/github/token", "ghp_test"));
    let config = HandlerConfig {
        github_api_url: server.uri(),
        ..HandlerConfig::default()
    };
    let handler =
        ReconciliationHandler::new(config, SecretResolver::new(store.clone(), store.clone())).unwrap();
    (handler, store)
}

fn event(request_type: RequestType, phase: Value) -> LifecycleEvent {
    let mut props = ResourceProperties::new(AuthDescriptor::token(TOKEN_PARAMETER));
    let phase = Some(phase.to_string());
    match request_type {
        RequestType::Create => props.create = phase,
        RequestType::Update => props.update = phase,
        RequestType::Delete => props.delete = phase,
    }
    let mut event = LifecycleEvent::new(request_type, props);
    event.request_id = Some("9c4f7d3c-request".into());
    event.logical_resource_id = Some("GithubRepository".into());
    if request_type != RequestType::Create {
        event.physical_resource_id = Some("pepperize/cdk-github-custom-resource-test".into());
    }
    event
}

fn create_repository() -> Value {
    json!({
        "endpoint": "repos",
        "method": "createInOrg",
        "parameters": { "org": "pepperize", "name": "cdk-github-custom-resource-test" },
        "physicalResourceId": { "responsePath": "full_name" },
        "outputPaths": ["id", "organization.id"]
    })
}

fn repository_body() -> Value {
    json!({
        "id": 558617288,
        "name": "cdk-github-custom-resource-test",
        "full_name": "pepperize/cdk-github-custom-resource-test",
        "description": null,
        "topics": [],
        "organization": { "login": "pepperize", "id": 60035171 }
    })
}

#[tokio::test]
async fn create_reports_physical_id_and_filtered_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orgs/pepperize/repos"))
        .and(header("authorization", "token ghp_test"))
        .respond_with(ResponseTemplate::new(201).set_body_json(repository_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (handler, store) = handler(&server);
    let result = handler
        .handle(&event(RequestType::Create, create_repository()))
        .await
        .unwrap()
        .expect("result");

    assert_eq!(
        result.physical_resource_id.as_deref(),
        Some("pepperize/cdk-github-custom-resource-test")
    );
    assert_eq!(
        Value::Object(result.data.unwrap()),
        json!({ "id": 558617288, "organization.id": 60035171 })
    );
    assert_eq!(store.parameter_reads(), 1);
}

#[tokio::test]
async fn identical_events_yield_identical_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orgs/pepperize/repos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(repository_body()))
        .expect(2)
        .mount(&server)
        .await;

    let (handler, _) = handler(&server);
    let event = event(RequestType::Create, create_repository());
    let first = handler.handle(&event).await.unwrap().unwrap();
    let second = handler.handle(&event).await.unwrap().unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn matching_delete_error_is_suppressed() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/repos/pepperize/cdk-github-custom-resource-test"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest/repos/repos#delete-a-repository"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (handler, _) = handler(&server);
    let result = handler
        .handle(&event(
            RequestType::Delete,
            json!({
                "endpoint": "repos",
                "method": "delete",
                "parameters": { "owner": "pepperize", "repo": "cdk-github-custom-resource-test" },
                "ignoreErrorCodesMatching": "Not Found"
            }),
        ))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn matching_create_error_is_suppressed_too() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orgs/pepperize/repos"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Repository creation failed.",
            "errors": [{ "resource": "Repository", "code": "custom", "field": "name", "message": "name already exists on this account" }]
        })))
        .mount(&server)
        .await;

    let (handler, _) = handler(&server);
    let mut call = create_repository();
    call["ignoreErrorCodesMatching"] = json!("name already exists on this account");
    let result = handler.handle(&event(RequestType::Create, call)).await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn look_ahead_pattern_does_not_block_create() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orgs/pepperize/repos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(repository_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (handler, _) = handler(&server);
    let mut call = create_repository();
    call["ignoreErrorCodesMatching"] = json!("already exists(?! for a fork)");
    let result = handler
        .handle(&event(RequestType::Create, call))
        .await
        .unwrap()
        .expect("result");
    assert_eq!(
        result.physical_resource_id.as_deref(),
        Some("pepperize/cdk-github-custom-resource-test")
    );
}

#[tokio::test]
async fn look_ahead_pattern_lets_the_api_error_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orgs/pepperize/repos"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Repository creation failed.",
            "errors": [{ "resource": "Repository", "code": "custom", "field": "name", "message": "name already exists on this account" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (handler, _) = handler(&server);
    let mut call = create_repository();
    call["ignoreErrorCodesMatching"] = json!("already exists(?! for a fork)");
    let err = handler
        .handle(&event(RequestType::Create, call))
        .await
        .unwrap_err();
    let err = match err {
        HandlerError::GitHub(err) => err,
        other => panic!("expected a GitHub error, got {other}"),
    };
    assert_eq!(err.as_api().expect("api error").status, 422);
}

#[tokio::test]
async fn non_matching_error_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "message": "Must have admin rights to Repository." })),
        )
        .mount(&server)
        .await;

    let (handler, _) = handler(&server);
    let err = handler
        .handle(&event(
            RequestType::Delete,
            json!({
                "endpoint": "repos",
                "method": "delete",
                "parameters": { "owner": "pepperize", "repo": "cdk-github-custom-resource-test" },
                "ignoreErrorCodesMatching": "Not Found"
            }),
        ))
        .await
        .unwrap_err();
    let err = match err {
        HandlerError::GitHub(err) => err,
        other => panic!("expected a GitHub error, got {other}"),
    };
    let api = err.as_api().expect("api error");
    assert_eq!(api.status, 403);
    assert_eq!(api.message, "Must have admin rights to Repository.");
}

#[tokio::test]
async fn update_without_identity_keeps_current_physical_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/repos/pepperize/cdk-github-custom-resource-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repository_body()))
        .mount(&server)
        .await;

    let (handler, _) = handler(&server);
    let result = handler
        .handle(&event(
            RequestType::Update,
            json!({
                "endpoint": "repos",
                "method": "update",
                "parameters": { "owner": "pepperize", "repo": "cdk-github-custom-resource-test", "description": "updated" },
                "outputPaths": []
            }),
        ))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        result.physical_resource_id.as_deref(),
        Some("pepperize/cdk-github-custom-resource-test")
    );
    assert!(result.data.unwrap().is_empty());
}

#[tokio::test]
async fn oversized_output_is_returned_anyway() {
    let server = MockServer::start().await;
    let big: Vec<String> = (0..300).map(|i| format!("topic-number-{i}")).collect();
    Mock::given(method("GET"))
        .and(path("/repos/pepperize/cdk-github-custom-resource-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "topics": big })))
        .mount(&server)
        .await;

    let (handler, _) = handler(&server);
    let result = handler
        .handle(&event(
            RequestType::Create,
            json!({
                "endpoint": "repos",
                "method": "get",
                "parameters": { "owner": "pepperize", "repo": "cdk-github-custom-resource-test" },
                "physicalResourceId": { "id": "pepperize/cdk-github-custom-resource-test" }
            }),
        ))
        .await
        .unwrap()
        .unwrap();
    assert!(result.encoded_len() > MAX_OUTPUT_BYTES);
    assert_eq!(result.data.as_ref().unwrap()["topics.299"], json!("topic-number-299"));
}

#[tokio::test]
async fn payload_round_trip_through_wire_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orgs/pepperize/repos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(repository_body()))
        .mount(&server)
        .await;

    let (handler, _) = handler(&server);
    let payload = serde_json::to_value(event(RequestType::Create, create_repository())).unwrap();
    let answer = handler.handle_payload(payload).await.unwrap();
    assert_eq!(
        answer,
        json!({
            "PhysicalResourceId": "pepperize/cdk-github-custom-resource-test",
            "Data": { "id": 558617288, "organization.id": 60035171 }
        })
    );
}
