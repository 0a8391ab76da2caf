//! Static catalogue of GitHub REST operations addressable by descriptors.
//!
//! Descriptors name an operation as `endpoint` + `method` in the style of
//! the octokit REST client (`repos.createInOrg`). The registry maps each
//! name to an HTTP verb and a path template; anything not listed is rejected
//! before a request is made.

use std::collections::HashMap;

/// HTTP verb of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Verb {
    /// The reqwest method.
    pub fn as_method(self) -> reqwest::Method {
        match self {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Patch => reqwest::Method::PATCH,
            Verb::Delete => reqwest::Method::DELETE,
        }
    }

    /// Whether leftover parameters travel in the query string.
    ///
    /// True for GET and DELETE. Octokit only does this for GET and HEAD and
    /// sends a JSON body with DELETE, so a DELETE that carries extra
    /// parameters is encoded differently here.
    pub fn uses_query(self) -> bool {
        matches!(self, Verb::Get | Verb::Delete)
    }
}

/// One REST operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    /// API group, e.g. `repos`.
    pub endpoint: &'static str,
    /// Operation name within the group, e.g. `createInOrg`.
    pub method: &'static str,
    /// HTTP verb.
    pub verb: Verb,
    /// Path template with `{param}` placeholders.
    pub path: &'static str,
}

impl Operation {
    const fn new(endpoint: &'static str, method: &'static str, verb: Verb, path: &'static str) -> Self {
        Self {
            endpoint,
            method,
            verb,
            path,
        }
    }

    /// `endpoint.method`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.endpoint, self.method)
    }

    /// Placeholder names in the path template, in order.
    pub fn path_parameters(&self) -> impl Iterator<Item = &'static str> {
        self.path.split('/').filter_map(|segment| {
            segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
        })
    }
}

use Verb::{Delete, Get, Patch, Post, Put};

/// `apps.createInstallationAccessToken`, used to exchange an app JWT.
pub(crate) const CREATE_INSTALLATION_ACCESS_TOKEN: Operation = Operation::new(
    "apps",
    "createInstallationAccessToken",
    Post,
    "/app/installations/{installation_id}/access_tokens",
);

/// The built-in operations.
pub const DEFAULT_OPERATIONS: &[Operation] = &[
    // repos
    Operation::new("repos", "get", Get, "/repos/{owner}/{repo}"),
    Operation::new("repos", "createInOrg", Post, "/orgs/{org}/repos"),
    Operation::new("repos", "createForAuthenticatedUser", Post, "/user/repos"),
    Operation::new("repos", "update", Patch, "/repos/{owner}/{repo}"),
    Operation::new("repos", "delete", Delete, "/repos/{owner}/{repo}"),
    Operation::new("repos", "getAllTopics", Get, "/repos/{owner}/{repo}/topics"),
    Operation::new("repos", "replaceAllTopics", Put, "/repos/{owner}/{repo}/topics"),
    Operation::new("repos", "addCollaborator", Put, "/repos/{owner}/{repo}/collaborators/{username}"),
    Operation::new("repos", "removeCollaborator", Delete, "/repos/{owner}/{repo}/collaborators/{username}"),
    Operation::new("repos", "createWebhook", Post, "/repos/{owner}/{repo}/hooks"),
    Operation::new("repos", "updateWebhook", Patch, "/repos/{owner}/{repo}/hooks/{hook_id}"),
    Operation::new("repos", "deleteWebhook", Delete, "/repos/{owner}/{repo}/hooks/{hook_id}"),
    Operation::new("repos", "createOrUpdateEnvironment", Put, "/repos/{owner}/{repo}/environments/{environment_name}"),
    Operation::new("repos", "deleteAnEnvironment", Delete, "/repos/{owner}/{repo}/environments/{environment_name}"),
    // actions secrets
    Operation::new("actions", "getEnvironmentPublicKey", Get, "/repositories/{repository_id}/environments/{environment_name}/secrets/public-key"),
    Operation::new("actions", "getOrgPublicKey", Get, "/orgs/{org}/actions/secrets/public-key"),
    Operation::new("actions", "getRepoPublicKey", Get, "/repos/{owner}/{repo}/actions/secrets/public-key"),
    Operation::new("actions", "createOrUpdateEnvironmentSecret", Put, "/repositories/{repository_id}/environments/{environment_name}/secrets/{secret_name}"),
    Operation::new("actions", "createOrUpdateOrgSecret", Put, "/orgs/{org}/actions/secrets/{secret_name}"),
    Operation::new("actions", "createOrUpdateRepoSecret", Put, "/repos/{owner}/{repo}/actions/secrets/{secret_name}"),
    Operation::new("actions", "getEnvironmentSecret", Get, "/repositories/{repository_id}/environments/{environment_name}/secrets/{secret_name}"),
    Operation::new("actions", "getOrgSecret", Get, "/orgs/{org}/actions/secrets/{secret_name}"),
    Operation::new("actions", "getRepoSecret", Get, "/repos/{owner}/{repo}/actions/secrets/{secret_name}"),
    Operation::new("actions", "deleteEnvironmentSecret", Delete, "/repositories/{repository_id}/environments/{environment_name}/secrets/{secret_name}"),
    Operation::new("actions", "deleteOrgSecret", Delete, "/orgs/{org}/actions/secrets/{secret_name}"),
    Operation::new("actions", "deleteRepoSecret", Delete, "/repos/{owner}/{repo}/actions/secrets/{secret_name}"),
    // actions variables
    Operation::new("actions", "createRepoVariable", Post, "/repos/{owner}/{repo}/actions/variables"),
    Operation::new("actions", "updateRepoVariable", Patch, "/repos/{owner}/{repo}/actions/variables/{name}"),
    // alias for updateRepoVariable
    Operation::new("actions", "createOrUpdateRepoVariable", Patch, "/repos/{owner}/{repo}/actions/variables/{name}"),
    Operation::new("actions", "deleteRepoVariable", Delete, "/repos/{owner}/{repo}/actions/variables/{name}"),
    // orgs
    Operation::new("orgs", "get", Get, "/orgs/{org}"),
    Operation::new("orgs", "update", Patch, "/orgs/{org}"),
    // teams
    Operation::new("teams", "create", Post, "/orgs/{org}/teams"),
    Operation::new("teams", "getByName", Get, "/orgs/{org}/teams/{team_slug}"),
    Operation::new("teams", "updateInOrg", Patch, "/orgs/{org}/teams/{team_slug}"),
    Operation::new("teams", "deleteInOrg", Delete, "/orgs/{org}/teams/{team_slug}"),
    Operation::new("teams", "addOrUpdateRepoPermissionsInOrg", Put, "/orgs/{org}/teams/{team_slug}/repos/{owner}/{repo}"),
    Operation::new("teams", "removeRepoInOrg", Delete, "/orgs/{org}/teams/{team_slug}/repos/{owner}/{repo}"),
    // users
    Operation::new("users", "getAuthenticated", Get, "/user"),
    // apps
    CREATE_INSTALLATION_ACCESS_TOKEN,
];

/// Lookup table from `endpoint.method` to [`Operation`].
#[derive(Debug, Clone)]
pub struct OperationRegistry {
    operations: HashMap<String, Operation>,
}

impl OperationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
        }
    }

    /// A registry holding [`DEFAULT_OPERATIONS`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for op in DEFAULT_OPERATIONS {
            registry.register(*op);
        }
        registry
    }

    /// Add or replace an operation.
    pub fn register(&mut self, operation: Operation) -> &mut Self {
        self.operations.insert(operation.name(), operation);
        self
    }

    /// Look up an operation.
    pub fn get(&self, endpoint: &str, method: &str) -> Option<&Operation> {
        self.operations.get(&format!("{endpoint}.{method}"))
    }

    /// Number of registered operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
