//! The provider-framework envelope: one lifecycle request in, one result out.

use crate::auth::AuthDescriptor;
use crate::descriptor::ApiCallDescriptor;
use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle phase of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// The resource is being created.
    Create,
    /// The resource properties changed.
    Update,
    /// The resource is being removed.
    Delete,
}

impl RequestType {
    /// Wire name of the phase.
    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::Create => "Create",
            RequestType::Update => "Update",
            RequestType::Delete => "Delete",
        }
    }
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `ResourceProperties` of a GitHub custom resource.
///
/// Each phase key holds a JSON-encoded [`crate::CallSpec`]; a missing key
/// means the phase has nothing to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceProperties {
    /// Descriptor for Create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<String>,
    /// Descriptor for Update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
    /// Descriptor for Delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
    /// Authentication.
    pub auth: AuthDescriptor,
    /// Provider service token, passed through by the framework.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_token: Option<String>,
}

impl ResourceProperties {
    /// Properties with only authentication set.
    pub fn new(auth: AuthDescriptor) -> Self {
        Self {
            create: None,
            update: None,
            delete: None,
            auth,
            service_token: None,
        }
    }

    /// The raw descriptor for a phase. Empty strings count as absent.
    pub fn descriptor_json(&self, request_type: RequestType) -> Option<&str> {
        let raw = match request_type {
            RequestType::Create => self.create.as_deref(),
            RequestType::Update => self.update.as_deref(),
            RequestType::Delete => self.delete.as_deref(),
        };
        raw.filter(|s| !s.trim().is_empty())
    }
}

/// An inbound lifecycle request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleEvent {
    /// Phase.
    pub request_type: RequestType,
    /// Unique id of this request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Logical id of the resource in the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,
    /// Current physical id (Update and Delete only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    /// Resource type, e.g. `Custom::GithubActions::RepositorySecret`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Stack id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    /// Resource properties.
    pub resource_properties: ResourceProperties,
}

impl LifecycleEvent {
    /// Build an event for `request_type` with the given properties.
    pub fn new(request_type: RequestType, resource_properties: ResourceProperties) -> Self {
        Self {
            request_type,
            request_id: None,
            logical_resource_id: None,
            physical_resource_id: None,
            resource_type: None,
            stack_id: None,
            resource_properties,
        }
    }

    /// Decode an event from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        serde_json::from_value(value).map_err(|e| ParseError::json("lifecycle event", e))
    }

    /// Parse the descriptor for this event's phase, if any.
    pub fn descriptor(&self) -> Result<Option<ApiCallDescriptor>, ParseError> {
        self.resource_properties
            .descriptor_json(self.request_type)
            .map(ApiCallDescriptor::parse)
            .transpose()
    }

    /// Physical id to fall back to when the descriptor does not define one:
    /// the request id on Create, the current physical id otherwise.
    pub fn default_physical_resource_id(&self) -> Option<String> {
        match self.request_type {
            RequestType::Create => self.request_id.clone(),
            RequestType::Update | RequestType::Delete => self
                .physical_resource_id
                .clone()
                .or_else(|| self.request_id.clone()),
        }
    }
}

/// The handler's answer to a lifecycle request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleResult {
    /// Physical resource id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    /// Attributes readable through `Fn::GetAtt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl LifecycleResult {
    /// Serialized size in bytes, as the framework would send it.
    pub fn encoded_len(&self) -> usize {
        serde_json::to_vec(self).map(|v| v.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthStrategy;
    use serde_json::json;

    fn framework_event() -> Value {
        json!({
            "RequestType": "Delete",
            "ServiceToken": "arn:aws:lambda:eu-west-1:1:function:provider",
            "ResponseURL": "https://cloudformation-custom-resource-response",
            "StackId": "arn:aws:cloudformation:eu-west-1:1:stack/s/1",
            "RequestId": "d2d9b7a2-1",
            "LogicalResourceId": "GithubRepo",
            "PhysicalResourceId": "pepperize/cdk-github",
            "ResourceType": "Custom::GithubRepo",
            "ResourceProperties": {
                "ServiceToken": "arn:aws:lambda:eu-west-1:1:function:provider",
                "Create": "{\"endpoint\":\"repos\",\"method\":\"createInOrg\"}",
                "Delete": "{\"endpoint\":\"repos\",\"method\":\"delete\",\"parameters\":{\"owner\":\"pepperize\",\"repo\":\"cdk-github\"}}",
                "Auth": { "strategy": "auth-app", "secret": "arn:aws:secretsmanager:eu-west-1:1:secret:auth" }
            }
        })
    }

    #[test]
    fn decodes_framework_event() {
        let event = LifecycleEvent::from_value(framework_event()).unwrap();
        assert_eq!(event.request_type, RequestType::Delete);
        assert_eq!(event.physical_resource_id.as_deref(), Some("pepperize/cdk-github"));
        assert_eq!(event.resource_properties.auth.strategy, AuthStrategy::App);

        let call = event.descriptor().unwrap().unwrap();
        assert_eq!(call.operation(), "repos.delete");
    }

    #[test]
    fn absent_phase_has_no_descriptor() {
        let mut value = framework_event();
        value["RequestType"] = json!("Update");
        let event = LifecycleEvent::from_value(value).unwrap();
        assert!(event.descriptor().unwrap().is_none());
    }

    #[test]
    fn empty_phase_string_has_no_descriptor() {
        let mut props = ResourceProperties::new(AuthDescriptor::unauthenticated());
        props.delete = Some(String::new());
        let event = LifecycleEvent::new(RequestType::Delete, props);
        assert!(event.descriptor().unwrap().is_none());
    }

    #[test]
    fn default_physical_id_by_phase() {
        let mut event = LifecycleEvent::from_value(framework_event()).unwrap();
        assert_eq!(
            event.default_physical_resource_id().as_deref(),
            Some("pepperize/cdk-github")
        );
        event.request_type = RequestType::Create;
        assert_eq!(event.default_physical_resource_id().as_deref(), Some("d2d9b7a2-1"));
    }

    #[test]
    fn result_wire_shape() {
        assert_eq!(serde_json::to_value(LifecycleResult::default()).unwrap(), json!({}));

        let mut data = Map::new();
        data.insert("data.id".into(), json!(558617288));
        let result = LifecycleResult {
            physical_resource_id: Some("pepperize/cdk-github".into()),
            data: Some(data),
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "PhysicalResourceId": "pepperize/cdk-github", "Data": { "data.id": 558617288 } })
        );
        assert_eq!(result.encoded_len(), serde_json::to_vec(&result).unwrap().len());
    }
}
