//! Pod mutator capability and pipeline
//!
//! A [`PodMutator`] takes a pod and returns a mutated copy. The input is never
//! modified, so a pipeline can diff its output against the original request
//! object. Mutators are composed in registration order.

use k8s_openapi::api::core::v1::Pod;
use tracing::debug;

use crate::{Error, Result};

/// A single pod transformation
pub trait PodMutator: Send + Sync {
    /// Short stable name used in logs and errors
    fn name(&self) -> &'static str;

    /// Return a mutated copy of `pod`
    fn mutate(&self, pod: &Pod) -> Result<Pod>;
}

/// Ordered list of mutators applied one after another
#[derive(Default)]
pub struct MutatorPipeline {
    mutators: Vec<Box<dyn PodMutator>>,
}

impl MutatorPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mutator to the pipeline
    pub fn with(mut self, mutator: impl PodMutator + 'static) -> Self {
        self.mutators.push(Box::new(mutator));
        self
    }

    /// Names of the registered mutators, in order
    pub fn names(&self) -> Vec<&'static str> {
        self.mutators.iter().map(|m| m.name()).collect()
    }
}

impl PodMutator for MutatorPipeline {
    fn name(&self) -> &'static str {
        "pipeline"
    }

    fn mutate(&self, pod: &Pod) -> Result<Pod> {
        let mut current = pod.clone();
        for mutator in &self.mutators {
            debug!(mutation = mutator.name(), "Applying pod mutation");
            current = mutator
                .mutate(&current)
                .map_err(|e| tag_error(mutator.name(), e))?;
        }
        Ok(current)
    }
}

/// Attach the failing mutator's name unless the error already carries one
fn tag_error(mutator: &'static str, err: Error) -> Error {
    match err {
        Error::Mutator { .. } => err,
        other => Error::mutator(mutator, other.to_string()),
    }
}
