//! HTTP probe to `curl` exec probe translation
//!
//! Pure functions: given an `httpGet` action and the owning container's
//! declared ports, build an exec action that performs the same request from
//! inside the pod's network namespace. The command fails on a non-2xx status
//! and discards the response body:
//!
//! ```text
//! curl <scheme>://<host>:<port><path> --fail -o /dev/null [-H "<name>: <value>"]...
//! ```

use k8s_openapi::api::core::v1::{ContainerPort, ExecAction, HTTPGetAction, HTTPHeader, Probe};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use tracing::debug;

/// Scheme used when the probe leaves it unset
pub const DEFAULT_SCHEME: &str = "http";

/// Host used when the probe leaves it unset. Loopback reaches every container
/// in the pod through the shared network namespace.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port used when neither a number nor a resolvable port name is given
pub const FALLBACK_PORT: i32 = 80;

/// Returns true if the probe is present and performs an HTTP GET.
///
/// Exec, TCP and gRPC probes are left to the kubelet.
pub fn is_http_probe(probe: Option<&Probe>) -> bool {
    probe.is_some_and(|p| p.http_get.is_some())
}

/// Resolve the probe port to a number.
///
/// A non-zero literal wins. Otherwise a port name is looked up in the
/// container's declared ports. Anything unresolved falls back to
/// [`FALLBACK_PORT`] without error.
pub fn resolve_port(port: &IntOrString, ports: &[ContainerPort]) -> i32 {
    let resolved = match port {
        IntOrString::Int(number) => *number,
        IntOrString::String(name) if !name.is_empty() => {
            let found = ports
                .iter()
                .find(|p| p.name.as_deref() == Some(name.as_str()))
                .map(|p| p.container_port)
                .unwrap_or(0);
            if found == 0 {
                debug!(port = %name, fallback = FALLBACK_PORT, "Named port not declared on container");
            }
            found
        }
        IntOrString::String(_) => 0,
    };

    if resolved == 0 {
        FALLBACK_PORT
    } else {
        resolved
    }
}

/// Convert probe headers into `-H "<name>: <value>"` argument pairs, keeping
/// declaration order.
pub fn headers_to_curl_args(headers: &[HTTPHeader]) -> Vec<String> {
    headers
        .iter()
        .flat_map(|h| ["-H".to_string(), format!("{}: {}", h.name, h.value)])
        .collect()
}

/// Build the `curl` exec action equivalent to an `httpGet` action
pub fn build_exec_action(action: &HTTPGetAction, ports: &[ContainerPort]) -> ExecAction {
    let scheme = action
        .scheme
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_SCHEME.to_string());

    let host = action
        .host
        .as_deref()
        .filter(|h| !h.is_empty())
        .unwrap_or(DEFAULT_HOST);

    let port = resolve_port(&action.port, ports);
    let path = action.path.as_deref().unwrap_or_default();

    let mut command = vec![
        "curl".to_string(),
        format!("{}://{}:{}{}", scheme, host, port, path),
        "--fail".to_string(),
        "-o".to_string(),
        "/dev/null".to_string(),
    ];
    command.extend(headers_to_curl_args(
        action.http_headers.as_deref().unwrap_or_default(),
    ));

    ExecAction {
        command: Some(command),
    }
}

/// Build the exec probe replacing `probe`.
///
/// Timing and threshold fields are copied verbatim. Returns `None` when the
/// probe has no `httpGet` action.
pub fn build_exec_probe(probe: &Probe, ports: &[ContainerPort]) -> Option<Probe> {
    let action = probe.http_get.as_ref()?;

    Some(Probe {
        exec: Some(build_exec_action(action, ports)),
        initial_delay_seconds: probe.initial_delay_seconds,
        timeout_seconds: probe.timeout_seconds,
        period_seconds: probe.period_seconds,
        success_threshold: probe.success_threshold,
        failure_threshold: probe.failure_threshold,
        termination_grace_period_seconds: probe.termination_grace_period_seconds,
        ..Default::default()
    })
}
