//! GitHub REST client.

use crate::error::{ApiError, GitHubError, map_reqwest_error};
use crate::operation::{CREATE_INSTALLATION_ACCESS_TOKEN, Operation};
use ghcr_auth::{AppCredentials, AuthError, ClientAuth};
use ghcr_secret::SecretValue;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::SystemTime;
use tokio::sync::OnceCell;
use zeroize::Zeroizing;

/// Default GitHub API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Media type requested on every call.
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// REST API version pinned on every call.
const API_VERSION: &str = "2022-11-28";

const API_VERSION_HEADER: &str = "x-github-api-version";

/// Default `User-Agent`. GitHub rejects requests without one.
pub const DEFAULT_USER_AGENT: &str = concat!("ghcr-handler/", env!("CARGO_PKG_VERSION"));

/// A successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body; `null` for empty bodies such as `204 No Content`.
    pub data: Value,
}

/// Client for the GitHub REST API, bound to one credential.
///
/// For app credentials with an installation id the app JWT is exchanged for
/// an installation token on first use; the token is kept for the lifetime
/// of the client.
///
/// ```no_run
/// use ghcr_auth::ClientAuth;
/// use ghcr_github::GitHubClient;
///
/// let client = GitHubClient::new(ClientAuth::Unauthenticated)
///     .base_url("https://github.example.com/api/v3");
/// ```
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
    auth: ClientAuth,
    installation_token: OnceCell<SecretValue>,
}

impl GitHubClient {
    /// Create a client for `api.github.com`.
    #[must_use]
    pub fn new(auth: ClientAuth) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.into(),
            user_agent: DEFAULT_USER_AGENT.into(),
            auth,
            installation_token: OnceCell::new(),
        }
    }

    /// Override the API base URL (GitHub Enterprise Server, mock servers).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// The credential this client sends.
    pub fn auth(&self) -> &ClientAuth {
        &self.auth
    }

    /// Invoke `operation` with `params`.
    pub async fn send(
        &self,
        operation: &Operation,
        params: &Map<String, Value>,
    ) -> Result<ApiResponse, GitHubError> {
        let authorization = self.authorization().await?;
        self.request(operation, params, authorization).await
    }

    async fn authorization(&self) -> Result<Option<HeaderValue>, GitHubError> {
        let value = match &self.auth {
            ClientAuth::Unauthenticated => return Ok(None),
            ClientAuth::Token(token) => token.with_str(|t| format!("token {t}")),
            ClientAuth::App(creds) => match creds.installation_id {
                None => format!("Bearer {}", creds.jwt(SystemTime::now())?),
                Some(installation_id) => {
                    let token = self
                        .installation_token
                        .get_or_try_init(|| self.exchange_installation_token(creds, installation_id))
                        .await?;
                    token.with_str(|t| format!("token {t}"))
                }
            },
        };
        sensitive_header(Zeroizing::new(value)).map(Some)
    }

    async fn exchange_installation_token(
        &self,
        creds: &AppCredentials,
        installation_id: u64,
    ) -> Result<SecretValue, GitHubError> {
        let jwt = Zeroizing::new(format!("Bearer {}", creds.jwt(SystemTime::now())?));
        let mut params = Map::new();
        params.insert("installation_id".into(), Value::from(installation_id));

        let response = self
            .request(
                &CREATE_INSTALLATION_ACCESS_TOKEN,
                &params,
                Some(sensitive_header(jwt)?),
            )
            .await?;
        let token = response
            .data
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| GitHubError::Decode {
                operation: CREATE_INSTALLATION_ACCESS_TOKEN.name(),
                reason: "response has no token".into(),
            })?;
        tracing::debug!(installation_id, "obtained installation access token");
        Ok(SecretValue::new(token.to_string()))
    }

    async fn request(
        &self,
        operation: &Operation,
        params: &Map<String, Value>,
        authorization: Option<HeaderValue>,
    ) -> Result<ApiResponse, GitHubError> {
        let (url, body) = build_request(&self.base_url, operation, params)?;
        let name = operation.name();
        tracing::debug!(operation = %name, method = %operation.verb.as_method(), url = %url, "sending GitHub request");

        let mut request = self
            .http
            .request(operation.verb.as_method(), url)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(API_VERSION_HEADER, API_VERSION)
            .header(USER_AGENT, &self.user_agent);
        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;
        tracing::debug!(operation = %name, status = status.as_u16(), "GitHub responded");

        if !status.is_success() {
            return Err(ApiError::from_response(status, &text).into());
        }

        let data = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| GitHubError::Decode {
                operation: name,
                reason: e.to_string(),
            })?
        };
        Ok(ApiResponse {
            status: status.as_u16(),
            data,
        })
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

fn sensitive_header(value: Zeroizing<String>) -> Result<HeaderValue, GitHubError> {
    let mut header = HeaderValue::from_str(&value).map_err(|_| {
        AuthError::InvalidCredentials("credential is not a valid header value".into())
    })?;
    header.set_sensitive(true);
    Ok(header)
}

/// Expand the path template and split the remaining parameters into query
/// string (GET, DELETE) or JSON body (everything else).
pub(crate) fn build_request(
    base_url: &str,
    operation: &Operation,
    params: &Map<String, Value>,
) -> Result<(reqwest::Url, Option<Value>), GitHubError> {
    let invalid = |reason: String| GitHubError::InvalidParameters {
        operation: operation.name(),
        reason,
    };

    let mut url = reqwest::Url::parse(base_url)
        .map_err(|e| invalid(format!("invalid base URL {base_url:?}: {e}")))?;
    let mut remaining = params.clone();
    let mut segments = Vec::new();
    for segment in operation.path.split('/').filter(|s| !s.is_empty()) {
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => {
                let value = remaining
                    .remove(name)
                    .ok_or_else(|| invalid(format!("missing path parameter {name:?}")))?;
                segments.push(
                    scalar_text(&value)
                        .ok_or_else(|| invalid(format!("path parameter {name:?} must be a scalar")))?,
                );
            }
            None => segments.push(segment.to_string()),
        }
    }
    url.path_segments_mut()
        .map_err(|_| invalid(format!("base URL {base_url:?} cannot carry a path")))?
        .pop_if_empty()
        .extend(&segments);

    remaining.retain(|_, v| !v.is_null());
    if operation.verb.uses_query() {
        if !remaining.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &remaining {
                let text = match value {
                    Value::Array(items) => items
                        .iter()
                        .map(|item| scalar_text(item).unwrap_or_else(|| item.to_string()))
                        .collect::<Vec<_>>()
                        .join(","),
                    other => scalar_text(other).unwrap_or_else(|| other.to_string()),
                };
                query.append_pair(key, &text);
            }
        }
        Ok((url, None))
    } else if remaining.is_empty() {
        Ok((url, None))
    } else {
        Ok((url, Some(Value::Object(remaining))))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
