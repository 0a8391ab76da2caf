//! Secret references.

use crate::arn::Arn;
use crate::error::ParseError;
use serde::{Deserialize, Serialize};

/// Where a secret value lives: a Secrets Manager ARN plus an optional JSON field.
///
/// Without a field the whole secret string is the value. With a field the
/// secret string is parsed as a JSON object and the named member is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretLocator {
    /// Secret ARN.
    #[serde(alias = "secretRef")]
    pub arn: String,
    /// JSON member to extract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl SecretLocator {
    /// Reference a whole secret.
    pub fn new(arn: impl Into<String>) -> Self {
        Self {
            arn: arn.into(),
            field: None,
        }
    }

    /// Reference one JSON member of a secret.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Parse the ARN to find the region and service.
    pub fn parsed_arn(&self) -> Result<Arn, ParseError> {
        Arn::parse(&self.arn)
    }
}
