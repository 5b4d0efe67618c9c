//! Pod mutation for mesh-enrolled workloads
//!
//! A transparent mesh proxy intercepts (and may encrypt) all pod traffic, which
//! breaks the kubelet's direct HTTP probing. This crate rewrites HTTP liveness
//! and readiness probes into `curl` exec probes hosted by a dedicated helper
//! container that shares the pod's network namespace.
//!
//! # Usage
//!
//! ```rust,ignore
//! let pipeline = MutatorPipeline::new().with(ProbeRewriter::new(RewriterConfig::default()));
//! let mutated = pipeline.mutate(&pod)?;
//! ```

#![deny(missing_docs)]

pub mod annotations;
pub mod error;
pub mod mutator;
pub mod rewriter;
pub mod translator;

pub use error::Error;
pub use mutator::{MutatorPipeline, PodMutator};
pub use rewriter::{ProbeRewriter, RewriterConfig};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
