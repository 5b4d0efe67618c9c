//! Probe rewriter for mesh-enrolled pods
//!
//! For every container with an HTTP liveness or readiness probe, the probe is
//! moved onto a new helper container (`local-curl-probe-<name>`) as an
//! equivalent `curl` exec probe, and removed from the source container.
//!
//! Rewriting happens in two phases over a private copy of the pod:
//! 1. **Plan**: walk the containers and build one [`ContainerRewrite`] per
//!    container that needs a helper. The pod is only read.
//! 2. **Apply**: clear the planned probes, append helpers to the end of the
//!    container list and write annotations.
//!
//! Helpers are only ever appended, so indices recorded during planning stay
//! valid while applying.
//!
//! Two annotations gate the rewrite: the Linkerd proxy-version annotation must
//! be present, and the rewritten marker must be absent. Once a helper has been
//! added the marker is set, so a second pass over the output is a no-op.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Container, Pod, Probe};
use tracing::{debug, instrument, warn};

use crate::annotations::{
    helper_container_name, ProbeKind, DEFAULT_HELPER_IMAGE, HELPER_COMMAND,
    HELPER_IMAGE_PULL_POLICY, MESH_PROXY_VERSION, PROBES_REWRITTEN, PROBES_REWRITTEN_VALUE,
    TERMINATION_MESSAGE_PATH, TERMINATION_MESSAGE_POLICY,
};
use crate::mutator::PodMutator;
use crate::translator::{build_exec_probe, is_http_probe};
use crate::{Error, Result};

/// Configuration for [`ProbeRewriter`]
#[derive(Clone, Debug, PartialEq)]
pub struct RewriterConfig {
    /// Image for helper containers; must provide `curl` and `sleep`
    pub helper_image: String,

    /// Store each replaced probe as JSON under a per-container annotation
    pub backup_probes: bool,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            helper_image: DEFAULT_HELPER_IMAGE.to_string(),
            backup_probes: true,
        }
    }
}

/// Rewrites HTTP probes of mesh pods into exec probes on helper containers
#[derive(Clone, Debug, Default)]
pub struct ProbeRewriter {
    config: RewriterConfig,
}

/// Planned edits for one source container
#[derive(Debug)]
struct ContainerRewrite {
    /// Index of the source container in `spec.containers`
    index: usize,
    /// Helper container carrying the translated probes
    helper: Container,
    /// Probes to clear on the source container
    cleared: Vec<ProbeKind>,
    /// Backup annotations (key, serialized probe)
    backups: Vec<(String, String)>,
}

impl ProbeRewriter {
    /// Create a rewriter with the given configuration
    pub fn new(config: RewriterConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &RewriterConfig {
        &self.config
    }

    /// Plan rewrites for every eligible container, in declaration order
    fn plan(&self, pod: &Pod) -> Vec<ContainerRewrite> {
        pod.spec
            .iter()
            .flat_map(|spec| spec.containers.iter().enumerate())
            .filter_map(|(index, container)| self.plan_container(index, container))
            .collect()
    }

    fn plan_container(&self, index: usize, container: &Container) -> Option<ContainerRewrite> {
        if !is_http_probe(container.liveness_probe.as_ref())
            && !is_http_probe(container.readiness_probe.as_ref())
        {
            debug!(
                container = %container.name,
                "No HTTP liveness or readiness probe, skipping"
            );
            return None;
        }

        let ports = container.ports.as_deref().unwrap_or_default();
        let mut rewrite = ContainerRewrite {
            index,
            helper: self.helper_container(&container.name),
            cleared: Vec::new(),
            backups: Vec::new(),
        };

        for kind in ProbeKind::ALL {
            let Some(probe) = probe_of(container, kind) else {
                continue;
            };
            let Some(exec) = build_exec_probe(probe, ports) else {
                continue;
            };

            if self.config.backup_probes
                && !record_backup(&mut rewrite, &container.name, kind, backup_probe(probe, kind))
            {
                continue;
            }

            debug!(
                container = %container.name,
                probe = %kind,
                "Replacing HTTP probe with exec probe"
            );
            *probe_slot(&mut rewrite.helper, kind) = Some(exec);
            rewrite.cleared.push(kind);
        }

        if rewrite.cleared.is_empty() {
            return None;
        }
        Some(rewrite)
    }

    /// Skeleton helper container for `source`, without probes
    fn helper_container(&self, source: &str) -> Container {
        Container {
            name: helper_container_name(source),
            image: Some(self.config.helper_image.clone()),
            image_pull_policy: Some(HELPER_IMAGE_PULL_POLICY.to_string()),
            command: Some(HELPER_COMMAND.iter().map(|s| s.to_string()).collect()),
            termination_message_path: Some(TERMINATION_MESSAGE_PATH.to_string()),
            termination_message_policy: Some(TERMINATION_MESSAGE_POLICY.to_string()),
            ..Default::default()
        }
    }
}

impl PodMutator for ProbeRewriter {
    fn name(&self) -> &'static str {
        "inject_curl"
    }

    #[instrument(skip(self, pod), fields(mutation = "inject_curl", pod = ?pod.metadata.name))]
    fn mutate(&self, pod: &Pod) -> Result<Pod> {
        let mut mutated = pod.clone();

        if !has_annotation(pod, MESH_PROXY_VERSION) {
            debug!("Pod is not part of the mesh, skipping");
            return Ok(mutated);
        }

        if has_annotation(pod, PROBES_REWRITTEN) {
            debug!("Probes already rewritten, skipping");
            return Ok(mutated);
        }

        let rewrites = self.plan(pod);
        if rewrites.is_empty() {
            debug!("No HTTP probes to rewrite");
            return Ok(mutated);
        }

        apply(&mut mutated, rewrites);
        Ok(mutated)
    }
}

/// Apply planned rewrites to `pod`
fn apply(pod: &mut Pod, rewrites: Vec<ContainerRewrite>) {
    let Some(spec) = pod.spec.as_mut() else {
        return;
    };
    let annotations = pod.metadata.annotations.get_or_insert_with(BTreeMap::new);

    for rewrite in rewrites {
        if let Some(source) = spec.containers.get_mut(rewrite.index) {
            for kind in &rewrite.cleared {
                *probe_slot(source, *kind) = None;
            }
        }
        annotations.extend(rewrite.backups);

        debug!(container = %rewrite.helper.name, "Adding probe helper container");
        spec.containers.push(rewrite.helper);
        annotations.insert(
            PROBES_REWRITTEN.to_string(),
            PROBES_REWRITTEN_VALUE.to_string(),
        );
    }
}

fn has_annotation(pod: &Pod, key: &str) -> bool {
    pod.metadata
        .annotations
        .as_ref()
        .is_some_and(|a| a.contains_key(key))
}

fn probe_of(container: &Container, kind: ProbeKind) -> Option<&Probe> {
    match kind {
        ProbeKind::Liveness => container.liveness_probe.as_ref(),
        ProbeKind::Readiness => container.readiness_probe.as_ref(),
    }
}

fn probe_slot(container: &mut Container, kind: ProbeKind) -> &mut Option<Probe> {
    match kind {
        ProbeKind::Liveness => &mut container.liveness_probe,
        ProbeKind::Readiness => &mut container.readiness_probe,
    }
}

/// Record the backup annotation for `kind`.
///
/// Returns false when the backup failed; the probe then stays on its source
/// container.
fn record_backup(
    rewrite: &mut ContainerRewrite,
    container: &str,
    kind: ProbeKind,
    backup: Result<String>,
) -> bool {
    match backup {
        Ok(value) => {
            rewrite
                .backups
                .push((kind.backup_annotation(container), value));
            true
        }
        Err(e) => {
            warn!(
                container = %container,
                probe = %kind,
                error = %e,
                "Unable to back up original probe, leaving it in place"
            );
            false
        }
    }
}

// Probe holds only strings, integers and string-keyed structs, so serde_json
// cannot fail on it today. The error only matters if the upstream type gains
// a field that does not serialize.
fn backup_probe(probe: &Probe, kind: ProbeKind) -> Result<String> {
    serde_json::to_string(probe).map_err(|e| Error::serialization(format!("{} probe", kind), e))
}
