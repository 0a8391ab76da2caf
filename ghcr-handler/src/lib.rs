#![deny(missing_docs)]
//! Reconciliation handler for GitHub custom resources.
//!
//! The provider framework invokes the handler once per lifecycle phase of a
//! custom resource. Each invocation carries a JSON call descriptor for the
//! phase; the handler authenticates, performs the call, and reports a
//! physical resource id plus a flat map of response attributes.
//!
//! | Module | Role |
//! |--------|------|
//! | [`handler`] | Request orchestration |
//! | [`normalize`] | Flattening, output filtering, physical id |
//! | [`classify`] | Error suppression |
//! | [`config`] | Environment configuration |
//! | [`telemetry`] | Subscriber setup |

pub mod classify;
pub mod config;
pub mod error;
pub mod handler;
pub mod normalize;
pub mod telemetry;

pub use classify::should_suppress;
pub use config::{ConfigError, HandlerConfig, LogFormat};
pub use error::HandlerError;
pub use handler::ReconciliationHandler;
pub use normalize::{MAX_OUTPUT_BYTES, NormalizedResponse, filter, flatten, physical_resource_id};
