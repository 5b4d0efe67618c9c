//! Metadata keys and helper-container constants
//!
//! Single source of truth for every name this crate writes into or reads from
//! a pod. The annotation keys are shared with tooling that inspects mutated
//! pods, so they must stay bit-exact.

// =============================================================================
// Annotations
// =============================================================================

/// Annotation stamped by the Linkerd proxy injector. Presence marks a mesh pod;
/// the value is ignored.
pub const MESH_PROXY_VERSION: &str = "linkerd.io/proxy-version";

/// Annotation recording that probes were already rewritten.
pub const PROBES_REWRITTEN: &str = "valewood.org/local-curl-probe";

/// Value written under [`PROBES_REWRITTEN`].
pub const PROBES_REWRITTEN_VALUE: &str = "yes";

const LIVENESS_BACKUP_PREFIX: &str = "valewood.org/lcp-olp-";
const READINESS_BACKUP_PREFIX: &str = "valewood.org/lcp-orp-";

/// Which of a container's probes is being handled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeKind {
    /// `livenessProbe`
    Liveness,
    /// `readinessProbe`
    Readiness,
}

impl ProbeKind {
    /// Both kinds in the order they are processed
    pub const ALL: [ProbeKind; 2] = [ProbeKind::Liveness, ProbeKind::Readiness];

    /// Lowercase name used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Liveness => "liveness",
            ProbeKind::Readiness => "readiness",
        }
    }

    /// Annotation key holding the serialized original probe of `container`.
    ///
    /// Format: `valewood.org/lcp-olp-{container}` for liveness,
    /// `valewood.org/lcp-orp-{container}` for readiness.
    pub fn backup_annotation(&self, container: &str) -> String {
        let prefix = match self {
            ProbeKind::Liveness => LIVENESS_BACKUP_PREFIX,
            ProbeKind::Readiness => READINESS_BACKUP_PREFIX,
        };
        format!("{}{}", prefix, container)
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Helper container
// =============================================================================

/// Prefix of the helper container name; the source container's name follows.
pub const HELPER_NAME_PREFIX: &str = "local-curl-probe-";

/// Default image for helper containers. Any image with `curl` and `sleep` works.
pub const DEFAULT_HELPER_IMAGE: &str = "rancher/curl:latest";

/// Pull policy for helper containers
pub const HELPER_IMAGE_PULL_POLICY: &str = "IfNotPresent";

/// Keeps the helper alive; its only job is hosting exec probes.
pub const HELPER_COMMAND: [&str; 2] = ["sleep", "365d"];

/// Kubernetes default termination message path
pub const TERMINATION_MESSAGE_PATH: &str = "/dev/termination-log";

/// Termination message policy for helper containers
pub const TERMINATION_MESSAGE_POLICY: &str = "FallbackToLogsOnError";

/// Name of the helper container hosting the probes of `container`.
pub fn helper_container_name(container: &str) -> String {
    format!("{}{}", HELPER_NAME_PREFIX, container)
}
