//! Response Normalizer.
//!
//! GitHub responses are arbitrarily nested; the provider framework only
//! accepts a flat string map of attributes, capped at 4096 bytes overall.
//! Responses are flattened into dot-joined paths and then narrowed by the
//! descriptor's `outputPaths` prefixes.

use ghcr_protocol::{LifecycleEvent, PhysicalResourceIdSpec};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Upper bound on the serialized result accepted by the framework.
pub const MAX_OUTPUT_BYTES: usize = 4096;

/// A flattened, filtered response.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    /// HTTP status of the call.
    pub status: u16,
    /// Path to leaf value.
    pub values: BTreeMap<String, Value>,
}

impl NormalizedResponse {
    /// Keep the keys of an already flattened body that fall under
    /// `output_paths`.
    pub fn new(status: u16, flattened: BTreeMap<String, Value>, output_paths: Option<&[String]>) -> Self {
        Self {
            status,
            values: filter(flattened, output_paths),
        }
    }

    /// The values as a JSON object, the shape of `Data` on the wire.
    pub fn into_data(self) -> Map<String, Value> {
        self.values.into_iter().collect()
    }
}

/// Flatten `value` into `path -> leaf`.
///
/// Object members extend the path by their key and array elements by their
/// index. Nulls and empty containers produce nothing. A scalar root is keyed
/// by the empty string.
pub fn flatten(value: &Value) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    walk(&mut Vec::new(), value, &mut out);
    out
}

fn walk(path: &mut Vec<String>, value: &Value, out: &mut BTreeMap<String, Value>) {
    match value {
        Value::Null => {}
        Value::Object(members) => {
            for (key, child) in members {
                path.push(key.clone());
                walk(path, child, out);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(index.to_string());
                walk(path, child, out);
                path.pop();
            }
        }
        leaf => {
            out.insert(path.join("."), leaf.clone());
        }
    }
}

/// Keep the entries whose key starts with any of `prefixes`.
///
/// `None` keeps everything; an empty list keeps nothing. Matching is a plain
/// string prefix test, so `data.i` matches `data.id`.
pub fn filter(map: BTreeMap<String, Value>, prefixes: Option<&[String]>) -> BTreeMap<String, Value> {
    match prefixes {
        None => map,
        Some(prefixes) => map
            .into_iter()
            .filter(|(key, _)| prefixes.iter().any(|p| key.starts_with(p.as_str())))
            .collect(),
    }
}

/// Derive the physical resource id.
///
/// A response path is looked up in the flattened (unfiltered) response; a
/// literal is used as is. When neither yields a value the event's own id is
/// kept: the request id on Create, the current physical id otherwise.
pub fn physical_resource_id(
    spec: Option<&PhysicalResourceIdSpec>,
    flattened: &BTreeMap<String, Value>,
    event: &LifecycleEvent,
) -> Option<String> {
    let derived = match spec {
        Some(PhysicalResourceIdSpec::Literal(id)) => Some(id.clone()),
        Some(PhysicalResourceIdSpec::ResponsePath(path)) => {
            let found = flattened.get(path).map(value_text);
            if found.is_none() {
                tracing::warn!(%path, "physical resource id path not found in response");
            }
            found
        }
        None => None,
    };
    derived.or_else(|| event.default_physical_resource_id())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghcr_protocol::{AuthDescriptor, RequestType, ResourceProperties};
    use serde_json::json;

    fn fixture() -> Value {
        json!({
            "status": 201,
            "url": "https://api.github.com/orgs/pepperize/repos",
            "data": {
                "id": 558617288,
                "name": "cdk-github-custom-resource-test",
                "description": null,
                "topics": [],
                "organization": { "login": "pepperize", "id": 60035171 }
            }
        })
    }

    fn prefixes(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn filters_single_key() {
        let result = filter(flatten(&fixture()), Some(prefixes(&["data.id"]).as_slice()));
        assert_eq!(result.len(), 1);
        assert_eq!(result["data.id"], json!(558617288));
    }

    #[test]
    fn filters_by_prefix() {
        let result = filter(flatten(&fixture()), Some(prefixes(&["data."]).as_slice()));
        assert_eq!(result["data.id"], json!(558617288));
        assert_eq!(result["data.organization.id"], json!(60035171));
        assert!(!result.contains_key("status"));
    }

    #[test]
    fn prefix_is_not_segment_aware() {
        let result = filter(flatten(&fixture()), Some(prefixes(&["data.i"]).as_slice()));
        assert_eq!(result.keys().collect::<Vec<_>>(), ["data.id"]);
    }

    #[test]
    fn no_filter_keeps_everything() {
        let result = filter(flatten(&fixture()), None);
        assert_eq!(result["status"], json!(201));
        assert_eq!(result["data.organization.id"], json!(60035171));
    }

    #[test]
    fn empty_filter_keeps_nothing() {
        assert!(filter(flatten(&fixture()), Some(&[][..])).is_empty());
    }

    #[test]
    fn flatten_shapes() {
        assert!(flatten(&json!({})).is_empty());
        assert!(flatten(&Value::Null).is_empty());
        assert_eq!(flatten(&json!(7))[""], json!(7));

        let flat = flatten(&json!({ "topics": ["cdk", "github"], "a": { "b": null, "c": {} } }));
        assert_eq!(flat.len(), 2);
        assert_eq!(flat["topics.0"], json!("cdk"));
        assert_eq!(flat["topics.1"], json!("github"));
    }

    fn event(request_type: RequestType) -> LifecycleEvent {
        let mut event =
            LifecycleEvent::new(request_type, ResourceProperties::new(AuthDescriptor::unauthenticated()));
        event.request_id = Some("request-1".into());
        if request_type != RequestType::Create {
            event.physical_resource_id = Some("existing".into());
        }
        event
    }

    #[test]
    fn physical_id_from_response_path() {
        let flat = flatten(&fixture()["data"]);
        let spec = PhysicalResourceIdSpec::from_response("organization.login");
        assert_eq!(
            physical_resource_id(Some(&spec), &flat, &event(RequestType::Create)).as_deref(),
            Some("pepperize")
        );
        let spec = PhysicalResourceIdSpec::from_response("id");
        assert_eq!(
            physical_resource_id(Some(&spec), &flat, &event(RequestType::Create)).as_deref(),
            Some("558617288")
        );
    }

    #[test]
    fn physical_id_literal_and_fallbacks() {
        let flat = BTreeMap::new();
        let literal = PhysicalResourceIdSpec::of("pepperize::cdk-github::example");
        assert_eq!(
            physical_resource_id(Some(&literal), &flat, &event(RequestType::Update)).as_deref(),
            Some("pepperize::cdk-github::example")
        );
        assert_eq!(
            physical_resource_id(None, &flat, &event(RequestType::Create)).as_deref(),
            Some("request-1")
        );
        assert_eq!(
            physical_resource_id(None, &flat, &event(RequestType::Delete)).as_deref(),
            Some("existing")
        );
        let missing = PhysicalResourceIdSpec::from_response("nope");
        assert_eq!(
            physical_resource_id(Some(&missing), &flat, &event(RequestType::Update)).as_deref(),
            Some("existing")
        );
    }

    #[test]
    fn normalized_response_uses_body_only() {
        let flattened = flatten(&fixture()["data"]);
        let normalized =
            NormalizedResponse::new(201, flattened, Some(prefixes(&["id", "organization.id"]).as_slice()));
        assert_eq!(normalized.status, 201);
        let data = normalized.into_data();
        assert_eq!(Value::Object(data), json!({ "id": 558617288, "organization.id": 60035171 }));
    }
}
