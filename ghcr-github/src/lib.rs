#![deny(missing_docs)]
//! GitHub REST access for ghcr.
//!
//! | Item | Role |
//! |------|------|
//! | [`OperationRegistry`] | `endpoint.method` to verb and path template |
//! | [`GitHubClient`] | Authenticated HTTP calls, installation token exchange |
//! | [`CallDispatcher`] | Executes an [`ApiCallDescriptor`](ghcr_protocol::ApiCallDescriptor), sealing secrets on the way |
//! | [`GitHubError`] / [`ApiError`] | Failure taxonomy |

pub mod client;
pub mod dispatch;
pub mod error;
pub mod operation;

pub use client::{ApiResponse, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, GitHubClient};
pub use dispatch::{CallDispatcher, ScopePublicKey};
pub use error::{ApiError, GitHubError};
pub use operation::{DEFAULT_OPERATIONS, Operation, OperationRegistry, Verb};
