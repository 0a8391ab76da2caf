//! Parse and validation errors.

use thiserror::Error;

/// A malformed event, descriptor or reference. Always fatal.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ParseError {
    /// The payload is not valid JSON or does not have the expected shape.
    #[error("invalid {what}: {source}")]
    Json {
        /// What was being parsed (e.g. "Create descriptor").
        what: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A reference that should be an ARN is not one.
    #[error("invalid ARN: {0}")]
    InvalidArn(String),

    /// Operation-specific parameters are missing or have the wrong shape.
    #[error("invalid parameters for {operation}: {reason}")]
    InvalidParameters {
        /// `endpoint.method` of the call.
        operation: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl ParseError {
    pub(crate) fn json(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            what: what.into(),
            source,
        }
    }
}
