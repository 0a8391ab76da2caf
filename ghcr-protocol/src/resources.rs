//! Descriptor builders for the actions-secret resources.
//!
//! Each builder yields the [`ResourceProperties`] a template would carry for
//! that resource: the same write call on Create and Update, and a scoped
//! delete call only when the secret is destroyed with the resource.

use crate::auth::AuthDescriptor;
use crate::descriptor::{CallSpec, PhysicalResourceIdSpec, SecretScope};
use crate::event::ResourceProperties;
use crate::secret::SecretLocator;
use serde_json::{Value, json};

/// What happens to the GitHub secret when the resource is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Leave the secret in place.
    #[default]
    Retain,
    /// Delete the secret.
    Destroy,
}

/// A repository actions secret.
#[derive(Debug, Clone)]
pub struct RepositorySecret {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repository_name: String,
    /// Secret name.
    pub secret_name: String,
    /// Plaintext source.
    pub source: SecretLocator,
    /// Removal policy.
    pub removal_policy: RemovalPolicy,
}

/// An organization actions secret.
#[derive(Debug, Clone)]
pub struct OrganizationSecret {
    /// Organization login.
    pub organization_name: String,
    /// Secret name.
    pub secret_name: String,
    /// `all`, `private` or `selected`.
    pub visibility: Option<String>,
    /// Repositories granted access when visibility is `selected`.
    pub selected_repository_ids: Option<Vec<u64>>,
    /// Plaintext source.
    pub source: SecretLocator,
    /// Removal policy.
    pub removal_policy: RemovalPolicy,
}

/// An environment actions secret.
#[derive(Debug, Clone)]
pub struct EnvironmentSecret {
    /// Numeric repository id.
    pub repository_id: u64,
    /// Environment name.
    pub environment_name: String,
    /// Secret name.
    pub secret_name: String,
    /// Plaintext source.
    pub source: SecretLocator,
    /// Removal policy.
    pub removal_policy: RemovalPolicy,
}

#[allow(clippy::too_many_arguments)]
fn secret_properties(
    auth: AuthDescriptor,
    scope: SecretScope,
    scope_params: Value,
    secret_name: &str,
    source: &SecretLocator,
    extra: Option<Value>,
    physical_id: String,
    removal_policy: RemovalPolicy,
) -> ResourceProperties {
    let mut write_params = scope_params.clone();
    write_params["secret_name"] = json!(secret_name);
    write_params["value"] = json!(source);
    if let (Some(Value::Object(extra)), Some(map)) = (extra, write_params.as_object_mut()) {
        map.extend(extra);
    }

    let write = CallSpec {
        endpoint: "actions".into(),
        method: scope.write_method().into(),
        parameters: Some(write_params),
        physical_resource_id: Some(PhysicalResourceIdSpec::of(physical_id)),
        ..Default::default()
    }
    .to_json_string();

    let delete = (removal_policy == RemovalPolicy::Destroy).then(|| {
        let mut delete_params = scope_params;
        delete_params["secret_name"] = json!(secret_name);
        CallSpec {
            endpoint: "actions".into(),
            method: scope.delete_method().into(),
            parameters: Some(delete_params),
            ..Default::default()
        }
        .to_json_string()
    });

    let mut props = ResourceProperties::new(auth);
    props.create = Some(write.clone());
    props.update = Some(write);
    props.delete = delete;
    props
}

impl RepositorySecret {
    /// Resource type reported to the deployment engine.
    pub const RESOURCE_TYPE: &'static str = "Custom::GithubActions::RepositorySecret";

    /// Build the resource properties.
    pub fn properties(&self, auth: AuthDescriptor) -> ResourceProperties {
        secret_properties(
            auth,
            SecretScope::Repository,
            json!({ "owner": self.owner, "repo": self.repository_name }),
            &self.secret_name,
            &self.source,
            None,
            format!(
                "{}::{}::{}",
                self.owner, self.repository_name, self.secret_name
            ),
            self.removal_policy,
        )
    }
}

impl OrganizationSecret {
    /// Resource type reported to the deployment engine.
    pub const RESOURCE_TYPE: &'static str = "Custom::GithubActions::OrganizationSecret";

    /// Build the resource properties.
    pub fn properties(&self, auth: AuthDescriptor) -> ResourceProperties {
        let mut extra = serde_json::Map::new();
        if let Some(visibility) = &self.visibility {
            extra.insert("visibility".into(), json!(visibility));
        }
        if let Some(ids) = &self.selected_repository_ids {
            extra.insert("selected_repository_ids".into(), json!(ids));
        }
        secret_properties(
            auth,
            SecretScope::Organization,
            json!({ "org": self.organization_name }),
            &self.secret_name,
            &self.source,
            Some(Value::Object(extra)),
            format!("{}::{}", self.organization_name, self.secret_name),
            self.removal_policy,
        )
    }
}

impl EnvironmentSecret {
    /// Resource type reported to the deployment engine.
    pub const RESOURCE_TYPE: &'static str = "Custom::GithubActions::EnvironmentSecret";

    /// Build the resource properties.
    pub fn properties(&self, auth: AuthDescriptor) -> ResourceProperties {
        secret_properties(
            auth,
            SecretScope::Environment,
            json!({
                "repository_id": self.repository_id,
                "environment_name": self.environment_name
            }),
            &self.secret_name,
            &self.source,
            None,
            format!(
                "{}::{}::{}",
                self.repository_id, self.environment_name, self.secret_name
            ),
            self.removal_policy,
        )
    }
}
