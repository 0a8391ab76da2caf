//! Error Classifier.

use ghcr_github::GitHubError;
use ghcr_protocol::ApiCallDescriptor;
use regex::Regex;

/// Whether `error` should be swallowed for `call`.
///
/// Only GitHub API errors qualify. A call without `ignoreErrorCodesMatching`
/// never suppresses; otherwise the pattern is searched for anywhere in the
/// error message. A pattern the regex engine rejects (look-around, for one)
/// suppresses nothing, so the original error surfaces.
pub fn should_suppress(call: &ApiCallDescriptor, error: &GitHubError) -> bool {
    let (Some(pattern), Some(api)) = (call.ignore_error_pattern.as_deref(), error.as_api()) else {
        return false;
    };
    match Regex::new(pattern) {
        Ok(regex) => regex.is_match(&api.message),
        Err(err) => {
            tracing::warn!(%pattern, error = %err, "ignoreErrorCodesMatching does not compile, not suppressing");
            false
        }
    }
}
