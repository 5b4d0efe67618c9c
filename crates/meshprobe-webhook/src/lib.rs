//! Meshprobe admission webhook
//!
//! Serves a Kubernetes mutating admission webhook that runs the
//! `meshprobe-mutation` pipeline over incoming pods and answers with a
//! JSON patch.
//!
//! # Endpoints
//!
//! - `POST /mutate/pods` - AdmissionReview for Pod CREATE/UPDATE
//! - `GET /healthz` - Health check

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod server;
pub mod telemetry;
pub mod webhook;

pub use error::Error;

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, Error>;
