//! # ghcr-protocol: the wire vocabulary of the GitHub custom-resource handler
//!
//! This crate defines the data that crosses the boundary between the
//! deployment engine and the reconciliation handler. It holds no behavior
//! beyond parsing and validation; resolving credentials, sealing secrets and
//! calling GitHub live in the higher crates.
//!
//! | Type | What it describes |
//! |------|-------------------|
//! | [`LifecycleEvent`] | One Create / Update / Delete request from the provider framework |
//! | [`ApiCallDescriptor`] | The GitHub REST call to make for a lifecycle phase |
//! | [`AuthDescriptor`] | Which authentication strategy to use and where its credential lives |
//! | [`SecretLocator`] | A secret reference (ARN plus optional JSON field) |
//! | [`SecretWriteParameters`] | Typed parameters of the three actions-secret write operations |
//! | [`LifecycleResult`] | Physical resource id and output data returned to the framework |
//!
//! ## Parsing Is Validation
//!
//! [`ApiCallDescriptor::parse`] turns the JSON-encoded descriptor into a typed
//! value up front: the secret-write parameters are decoded into their
//! scope-specific shape. A descriptor that survives parsing can be dispatched
//! without further checks. The error-suppression pattern is the exception:
//! it stays a string until a call actually fails.

#![deny(missing_docs)]

pub mod arn;
pub mod auth;
pub mod de;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod resources;
pub mod secret;

pub use arn::Arn;
pub use auth::{AuthDescriptor, AuthStrategy};
pub use descriptor::{
    ApiCallDescriptor, CallParameters, CallSpec, PhysicalResourceIdSpec, SecretScope,
    SecretWriteParameters,
};
pub use error::ParseError;
pub use event::{LifecycleEvent, LifecycleResult, RequestType, ResourceProperties};
pub use secret::SecretLocator;
