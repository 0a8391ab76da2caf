//! GitHub API call descriptors.
//!
//! A descriptor names one REST operation by `endpoint` + `method` (the
//! grouping used by GitHub's REST reference, e.g. `repos.createInOrg`), the
//! parameters to call it with, how to derive the physical resource id from
//! the response, which errors to tolerate, and which response paths to return.

use crate::de::{opt_vec_u64_or_string, u64_or_string};
use crate::error::ParseError;
use crate::secret::SecretLocator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How the physical resource id is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPhysicalResourceId", into = "RawPhysicalResourceId")]
pub enum PhysicalResourceIdSpec {
    /// A fixed id.
    Literal(String),
    /// A dot path into the flattened response data.
    ResponsePath(String),
}

impl PhysicalResourceIdSpec {
    /// A fixed physical id.
    pub fn of(id: impl Into<String>) -> Self {
        Self::Literal(id.into())
    }

    /// Take the physical id from a response path.
    pub fn from_response(path: impl Into<String>) -> Self {
        Self::ResponsePath(path.into())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPhysicalResourceId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response_path: Option<String>,
}

impl TryFrom<RawPhysicalResourceId> for PhysicalResourceIdSpec {
    type Error = String;

    fn try_from(raw: RawPhysicalResourceId) -> Result<Self, Self::Error> {
        match (raw.response_path, raw.id) {
            (Some(path), _) => Ok(Self::ResponsePath(path)),
            (None, Some(id)) => Ok(Self::Literal(id)),
            (None, None) => Err("physicalResourceId requires `id` or `responsePath`".into()),
        }
    }
}

impl From<PhysicalResourceIdSpec> for RawPhysicalResourceId {
    fn from(spec: PhysicalResourceIdSpec) -> Self {
        match spec {
            PhysicalResourceIdSpec::Literal(id) => Self {
                id: Some(id),
                response_path: None,
            },
            PhysicalResourceIdSpec::ResponsePath(path) => Self {
                id: None,
                response_path: Some(path),
            },
        }
    }
}

/// The serialized form of a call descriptor, exactly as it appears in
/// `ResourceProperties.Create|Update|Delete`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSpec {
    /// API group, e.g. `repos`.
    pub endpoint: String,
    /// Operation within the group, e.g. `createInOrg`.
    pub method: String,
    /// Operation parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// How to derive the physical resource id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<PhysicalResourceIdSpec>,
    /// Regular expression matched against failure messages; a match swallows the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_error_codes_matching: Option<String>,
    /// Prefixes of flattened response keys to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_paths: Option<Vec<String>>,
}

impl CallSpec {
    /// Serialize to the JSON string stored in resource properties.
    pub fn to_json_string(&self) -> String {
        // A CallSpec only holds strings, vectors and JSON values: serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Which scope an actions secret belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretScope {
    /// Deployment environment of a repository.
    Environment,
    /// Organization-wide secret.
    Organization,
    /// Repository secret.
    Repository,
}

impl SecretScope {
    /// All scopes.
    pub const ALL: [SecretScope; 3] = [
        SecretScope::Environment,
        SecretScope::Organization,
        SecretScope::Repository,
    ];

    /// Detect a secret-write operation.
    pub fn from_operation(endpoint: &str, method: &str) -> Option<Self> {
        if endpoint != "actions" {
            return None;
        }
        Self::ALL.into_iter().find(|scope| scope.write_method() == method)
    }

    /// The create-or-update method.
    pub fn write_method(self) -> &'static str {
        match self {
            SecretScope::Environment => "createOrUpdateEnvironmentSecret",
            SecretScope::Organization => "createOrUpdateOrgSecret",
            SecretScope::Repository => "createOrUpdateRepoSecret",
        }
    }

    /// The method returning the scope's sealing public key.
    pub fn public_key_method(self) -> &'static str {
        match self {
            SecretScope::Environment => "getEnvironmentPublicKey",
            SecretScope::Organization => "getOrgPublicKey",
            SecretScope::Repository => "getRepoPublicKey",
        }
    }

    /// The scoped delete method.
    pub fn delete_method(self) -> &'static str {
        match self {
            SecretScope::Environment => "deleteEnvironmentSecret",
            SecretScope::Organization => "deleteOrgSecret",
            SecretScope::Repository => "deleteRepoSecret",
        }
    }
}

/// Parameters of the three secret-write operations.
///
/// `value` references the plaintext in Secrets Manager; it is replaced by
/// `encrypted_value` + `key_id` before the request leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretWriteParameters {
    /// `actions.createOrUpdateEnvironmentSecret`.
    Environment {
        /// Numeric repository id.
        repository_id: u64,
        /// Environment name.
        environment_name: String,
        /// Secret name.
        secret_name: String,
        /// Plaintext source.
        value: SecretLocator,
    },
    /// `actions.createOrUpdateOrgSecret`.
    Organization {
        /// Organization login.
        org: String,
        /// Secret name.
        secret_name: String,
        /// `all`, `private` or `selected`.
        visibility: Option<String>,
        /// Repositories granted access when visibility is `selected`.
        selected_repository_ids: Option<Vec<u64>>,
        /// Plaintext source.
        value: SecretLocator,
    },
    /// `actions.createOrUpdateRepoSecret`.
    Repository {
        /// Repository owner.
        owner: String,
        /// Repository name.
        repo: String,
        /// Secret name.
        secret_name: String,
        /// Plaintext source.
        value: SecretLocator,
    },
}

#[derive(Deserialize)]
struct EnvironmentSecretWire {
    #[serde(deserialize_with = "u64_or_string")]
    repository_id: u64,
    environment_name: String,
    secret_name: String,
    value: SecretLocator,
}

#[derive(Deserialize)]
struct OrganizationSecretWire {
    org: String,
    secret_name: String,
    #[serde(default)]
    visibility: Option<String>,
    #[serde(default, deserialize_with = "opt_vec_u64_or_string")]
    selected_repository_ids: Option<Vec<u64>>,
    value: SecretLocator,
}

#[derive(Deserialize)]
struct RepositorySecretWire {
    owner: String,
    #[serde(alias = "repository_name")]
    repo: String,
    secret_name: String,
    value: SecretLocator,
}

impl SecretWriteParameters {
    /// Decode the parameters of a secret-write operation for `scope`.
    pub fn from_value(scope: SecretScope, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match scope {
            SecretScope::Environment => {
                let w: EnvironmentSecretWire = serde_json::from_value(value)?;
                Self::Environment {
                    repository_id: w.repository_id,
                    environment_name: w.environment_name,
                    secret_name: w.secret_name,
                    value: w.value,
                }
            }
            SecretScope::Organization => {
                let w: OrganizationSecretWire = serde_json::from_value(value)?;
                Self::Organization {
                    org: w.org,
                    secret_name: w.secret_name,
                    visibility: w.visibility,
                    selected_repository_ids: w.selected_repository_ids,
                    value: w.value,
                }
            }
            SecretScope::Repository => {
                let w: RepositorySecretWire = serde_json::from_value(value)?;
                Self::Repository {
                    owner: w.owner,
                    repo: w.repo,
                    secret_name: w.secret_name,
                    value: w.value,
                }
            }
        })
    }

    /// The scope these parameters write to.
    pub fn scope(&self) -> SecretScope {
        match self {
            Self::Environment { .. } => SecretScope::Environment,
            Self::Organization { .. } => SecretScope::Organization,
            Self::Repository { .. } => SecretScope::Repository,
        }
    }

    /// The GitHub secret name.
    pub fn secret_name(&self) -> &str {
        match self {
            Self::Environment { secret_name, .. }
            | Self::Organization { secret_name, .. }
            | Self::Repository { secret_name, .. } => secret_name,
        }
    }

    /// Where the plaintext lives.
    pub fn locator(&self) -> &SecretLocator {
        match self {
            Self::Environment { value, .. }
            | Self::Organization { value, .. }
            | Self::Repository { value, .. } => value,
        }
    }

    /// Parameters identifying the scope, as used by the public-key lookup.
    pub fn scope_parameters(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            Self::Environment {
                repository_id,
                environment_name,
                ..
            } => {
                map.insert("repository_id".into(), Value::from(*repository_id));
                map.insert(
                    "environment_name".into(),
                    Value::from(environment_name.as_str()),
                );
            }
            Self::Organization { org, .. } => {
                map.insert("org".into(), Value::from(org.as_str()));
            }
            Self::Repository { owner, repo, .. } => {
                map.insert("owner".into(), Value::from(owner.as_str()));
                map.insert("repo".into(), Value::from(repo.as_str()));
            }
        }
        map
    }

    /// The parameters of the final write call: scope identifiers, secret
    /// name, the sealed value and the id of the key it was sealed with.
    /// The plaintext locator is not carried over.
    pub fn sealed_parameters(&self, encrypted_value: &str, key_id: &str) -> Map<String, Value> {
        let mut map = self.scope_parameters();
        map.insert("secret_name".into(), Value::from(self.secret_name()));
        map.insert("encrypted_value".into(), Value::from(encrypted_value));
        map.insert("key_id".into(), Value::from(key_id));
        if let Self::Organization {
            visibility,
            selected_repository_ids,
            ..
        } = self
        {
            if let Some(visibility) = visibility {
                map.insert("visibility".into(), Value::from(visibility.as_str()));
            }
            if let Some(ids) = selected_repository_ids {
                map.insert(
                    "selected_repository_ids".into(),
                    Value::from(ids.clone()),
                );
            }
        }
        map
    }
}

/// Call parameters, typed by operation family.
#[derive(Debug, Clone, PartialEq)]
pub enum CallParameters {
    /// Any operation: passed through as given.
    Generic(Map<String, Value>),
    /// One of the three secret-write operations.
    SecretWrite(SecretWriteParameters),
}

/// A parsed and validated call descriptor.
#[derive(Debug, Clone)]
pub struct ApiCallDescriptor {
    /// API group, e.g. `repos`.
    pub endpoint: String,
    /// Operation within the group.
    pub method: String,
    /// Typed parameters.
    pub parameters: CallParameters,
    /// Physical id derivation. `None` falls back to the event's ids.
    pub physical_resource_id: Option<PhysicalResourceIdSpec>,
    /// `ignoreErrorCodesMatching`, kept as written. It is only compiled
    /// once a call has failed.
    pub ignore_error_pattern: Option<String>,
    /// Output prefix filter.
    pub output_paths: Option<Vec<String>>,
}

impl ApiCallDescriptor {
    /// Parse the JSON string stored under a lifecycle phase key.
    pub fn parse(json: &str) -> Result<Self, ParseError> {
        let spec: CallSpec =
            serde_json::from_str(json).map_err(|e| ParseError::json("call descriptor", e))?;
        Self::from_spec(spec)
    }

    /// Validate a [`CallSpec`].
    pub fn from_spec(spec: CallSpec) -> Result<Self, ParseError> {
        let operation = format!("{}.{}", spec.endpoint, spec.method);

        let raw = spec.parameters.unwrap_or(Value::Null);
        let parameters = match SecretScope::from_operation(&spec.endpoint, &spec.method) {
            Some(scope) => CallParameters::SecretWrite(
                SecretWriteParameters::from_value(scope, raw).map_err(|e| {
                    ParseError::InvalidParameters {
                        operation: operation.clone(),
                        reason: e.to_string(),
                    }
                })?,
            ),
            None => match raw {
                Value::Null => CallParameters::Generic(Map::new()),
                Value::Object(map) => CallParameters::Generic(map),
                other => {
                    return Err(ParseError::InvalidParameters {
                        operation,
                        reason: format!("expected an object, got {other}"),
                    });
                }
            },
        };

        Ok(Self {
            endpoint: spec.endpoint,
            method: spec.method,
            parameters,
            physical_resource_id: spec.physical_resource_id,
            ignore_error_pattern: spec.ignore_error_codes_matching,
            output_paths: spec.output_paths,
        })
    }

    /// `endpoint.method`.
    pub fn operation(&self) -> String {
        format!("{}.{}", self.endpoint, self.method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_generic_descriptor() {
        let call = ApiCallDescriptor::parse(
            &json!({
                "endpoint": "repos",
                "method": "createInOrg",
                "parameters": { "org": "pepperize", "name": "cdk-github" },
                "outputPaths": ["id", "full_name"],
                "physicalResourceId": { "responsePath": "full_name" },
                "ignoreErrorCodesMatching": "name already exists on this account"
            })
            .to_string(),
        )
        .unwrap();

        assert_eq!(call.operation(), "repos.createInOrg");
        assert_eq!(
            call.physical_resource_id,
            Some(PhysicalResourceIdSpec::ResponsePath("full_name".into()))
        );
        assert_eq!(call.output_paths, Some(vec!["id".into(), "full_name".into()]));
        assert_eq!(
            call.ignore_error_pattern.as_deref(),
            Some("name already exists on this account")
        );
        match call.parameters {
            CallParameters::Generic(map) => assert_eq!(map["org"], "pepperize"),
            other => panic!("unexpected parameters: {other:?}"),
        }
    }

    #[test]
    fn missing_parameters_become_empty_map() {
        let call = ApiCallDescriptor::parse(r#"{"endpoint":"users","method":"getAuthenticated"}"#)
            .unwrap();
        assert_eq!(call.parameters, CallParameters::Generic(Map::new()));
        assert!(call.physical_resource_id.is_none());
        assert!(call.output_paths.is_none());
    }

    #[test]
    fn rejects_non_object_parameters() {
        let err = ApiCallDescriptor::parse(
            r#"{"endpoint":"repos","method":"get","parameters":[1,2]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::InvalidParameters { .. }));
    }

    #[test]
    fn error_pattern_is_not_compiled_at_parse_time() {
        for pattern in ["already exists(?! for a fork)", "(unclosed"] {
            let spec = json!({
                "endpoint": "repos",
                "method": "delete",
                "ignoreErrorCodesMatching": pattern
            });
            let call = ApiCallDescriptor::parse(&spec.to_string()).unwrap();
            assert_eq!(call.ignore_error_pattern.as_deref(), Some(pattern));
        }
    }

    #[test]
    fn rejects_malformed_json() {
        let err = ApiCallDescriptor::parse("{not json").unwrap_err();
        assert!(matches!(err, ParseError::Json { .. }));
    }

    #[test]
    fn literal_physical_id() {
        let call = ApiCallDescriptor::parse(
            r#"{"endpoint":"repos","method":"get","physicalResourceId":{"id":"fixed"}}"#,
        )
        .unwrap();
        assert_eq!(
            call.physical_resource_id,
            Some(PhysicalResourceIdSpec::Literal("fixed".into()))
        );
    }

    #[test]
    fn empty_physical_id_object_is_rejected() {
        let err = ApiCallDescriptor::parse(
            r#"{"endpoint":"repos","method":"get","physicalResourceId":{}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Json { .. }));
    }

    #[test]
    fn repository_secret_write_is_typed() {
        let call = ApiCallDescriptor::parse(
            &json!({
                "endpoint": "actions",
                "method": "createOrUpdateRepoSecret",
                "parameters": {
                    "owner": "pepperize",
                    "repository_name": "cdk-github",
                    "secret_name": "EXAMPLE",
                    "value": { "arn": "arn:aws:secretsmanager:eu-west-1:1:secret:s", "field": "f" }
                }
            })
            .to_string(),
        )
        .unwrap();

        let CallParameters::SecretWrite(params) = call.parameters else {
            panic!("expected secret write parameters");
        };
        assert_eq!(params.scope(), SecretScope::Repository);
        assert_eq!(params.secret_name(), "EXAMPLE");
        assert_eq!(params.locator().field.as_deref(), Some("f"));
        assert_eq!(
            params.scope_parameters(),
            json!({ "owner": "pepperize", "repo": "cdk-github" })
                .as_object()
                .unwrap()
                .clone()
        );
    }

    #[test]
    fn environment_secret_accepts_string_repository_id() {
        let call = ApiCallDescriptor::parse(
            &json!({
                "endpoint": "actions",
                "method": "createOrUpdateEnvironmentSecret",
                "parameters": {
                    "repository_id": "558617288",
                    "environment_name": "production",
                    "secret_name": "TOKEN",
                    "value": { "arn": "arn:aws:secretsmanager:eu-west-1:1:secret:s" }
                }
            })
            .to_string(),
        )
        .unwrap();
        let CallParameters::SecretWrite(params) = call.parameters else {
            panic!("expected secret write parameters");
        };
        assert_eq!(
            Value::Object(params.scope_parameters()),
            json!({ "repository_id": 558617288, "environment_name": "production" })
        );
    }

    #[test]
    fn organization_secret_accepts_string_repository_ids() {
        let call = ApiCallDescriptor::parse(
            &json!({
                "endpoint": "actions",
                "method": "createOrUpdateOrgSecret",
                "parameters": {
                    "org": "pepperize",
                    "secret_name": "TOKEN",
                    "visibility": "selected",
                    "selected_repository_ids": ["558617288", 42],
                    "value": { "arn": "arn:aws:secretsmanager:eu-west-1:1:secret:s" }
                }
            })
            .to_string(),
        )
        .unwrap();
        let CallParameters::SecretWrite(SecretWriteParameters::Organization {
            selected_repository_ids,
            ..
        }) = call.parameters
        else {
            panic!("expected organization secret parameters");
        };
        assert_eq!(selected_repository_ids, Some(vec![558617288, 42]));
    }

    #[test]
    fn secret_write_without_value_is_invalid() {
        let err = ApiCallDescriptor::parse(
            r#"{"endpoint":"actions","method":"createOrUpdateOrgSecret","parameters":{"org":"o","secret_name":"s"}}"#,
        )
        .unwrap_err();
        match err {
            ParseError::InvalidParameters { operation, reason } => {
                assert_eq!(operation, "actions.createOrUpdateOrgSecret");
                assert!(reason.contains("value"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn sealed_parameters_drop_the_locator() {
        let params = SecretWriteParameters::Organization {
            org: "pepperize".into(),
            secret_name: "TOKEN".into(),
            visibility: Some("selected".into()),
            selected_repository_ids: Some(vec![1, 2]),
            value: SecretLocator::new("arn:aws:secretsmanager:eu-west-1:1:secret:s"),
        };
        let sealed = Value::Object(params.sealed_parameters("c2VhbGVk", "key-1"));
        assert_eq!(
            sealed,
            json!({
                "org": "pepperize",
                "secret_name": "TOKEN",
                "encrypted_value": "c2VhbGVk",
                "key_id": "key-1",
                "visibility": "selected",
                "selected_repository_ids": [1, 2]
            })
        );
    }

    #[test]
    fn scope_detection() {
        assert_eq!(
            SecretScope::from_operation("actions", "createOrUpdateEnvironmentSecret"),
            Some(SecretScope::Environment)
        );
        assert_eq!(SecretScope::from_operation("actions", "deleteOrgSecret"), None);
        assert_eq!(
            SecretScope::from_operation("repos", "createOrUpdateRepoSecret"),
            None
        );
    }

    #[test]
    fn call_spec_serializes_camel_case() {
        let spec = CallSpec {
            endpoint: "repos".into(),
            method: "get".into(),
            physical_resource_id: Some(PhysicalResourceIdSpec::from_response("full_name")),
            output_paths: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            serde_json::from_str::<Value>(&spec.to_json_string()).unwrap(),
            json!({
                "endpoint": "repos",
                "method": "get",
                "physicalResourceId": { "responsePath": "full_name" },
                "outputPaths": []
            })
        );
    }
}
