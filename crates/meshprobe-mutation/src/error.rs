//! Error types for pod mutation
//!
//! The probe rewriter absorbs its own failures (a probe that cannot be backed
//! up is left in place), so these errors mostly surface through the mutator
//! pipeline, tagged with the mutator that produced them.

use thiserror::Error;

/// Main error type for pod mutation
#[derive(Debug, Error)]
pub enum Error {
    /// Serializing a resource fragment failed
    #[error("serialization error [{kind}]: {message}")]
    Serialization {
        /// What was being serialized (e.g., "liveness probe")
        kind: String,
        /// Description of what failed
        message: String,
    },

    /// A mutator in the pipeline failed
    #[error("mutator {mutator} failed: {message}")]
    Mutator {
        /// Name of the failing mutator
        mutator: String,
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a serialization error for the given fragment kind
    pub fn serialization(kind: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            kind: kind.into(),
            message: source.to_string(),
        }
    }

    /// Create a mutator error tagged with the mutator's name
    pub fn mutator(mutator: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Mutator {
            mutator: mutator.into(),
            message: msg.into(),
        }
    }
}
