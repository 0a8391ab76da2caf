//! Amazon Resource Names.
//!
//! Secret and parameter references arrive as ARNs. The handler needs the
//! region (to talk to the right regional endpoint) and, for SSM parameters,
//! the resource part (to derive the parameter name).

use crate::error::ParseError;
use std::fmt;
use std::str::FromStr;

/// A parsed `arn:partition:service:region:account:resource` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    /// Partition (`aws`, `aws-cn`, `aws-us-gov`).
    pub partition: String,
    /// Service namespace (`secretsmanager`, `ssm`).
    pub service: String,
    /// Region, empty for global resources.
    pub region: String,
    /// Account id.
    pub account_id: String,
    /// Everything after the fifth colon, colons included.
    pub resource: String,
}

impl Arn {
    /// Parse an ARN string.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut parts = input.splitn(6, ':');
        let prefix = parts.next();
        let (partition, service, region, account_id, resource) = match (
            prefix,
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) {
            (Some("arn"), Some(p), Some(s), Some(r), Some(a)) => match parts.next() {
                Some(res) => (p, s, r, a, res),
                None => return Err(ParseError::InvalidArn(input.to_string())),
            },
            _ => return Err(ParseError::InvalidArn(input.to_string())),
        };
        if partition.is_empty() || service.is_empty() || resource.is_empty() {
            return Err(ParseError::InvalidArn(input.to_string()));
        }
        Ok(Self {
            partition: partition.to_string(),
            service: service.to_string(),
            region: region.to_string(),
            account_id: account_id.to_string(),
            resource: resource.to_string(),
        })
    }

    /// True for SSM Parameter Store parameters.
    pub fn is_ssm_parameter(&self) -> bool {
        self.service == "ssm" && self.resource.starts_with("parameter")
    }

    /// The parameter name of an SSM parameter ARN.
    ///
    /// `arn:aws:ssm:eu-west-1:123:parameter/github/token` yields
    /// `/github/token`. Only the leading `parameter` literal is removed.
    pub fn ssm_parameter_name(&self) -> Option<String> {
        if !self.is_ssm_parameter() {
            return None;
        }
        self.resource
            .strip_prefix("parameter")
            .map(|name| name.to_string())
    }
}

impl FromStr for Arn {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Arn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}
