//! Admission round-trip tests
//!
//! Drive the webhook with real AdmissionReview payloads and check that the
//! returned JSON patch, applied to the submitted pod, yields the rewritten pod.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use k8s_openapi::api::core::v1::{Container, ContainerPort, HTTPGetAction, Pod, PodSpec, Probe};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::core::admission::{AdmissionRequest, AdmissionReview};
use meshprobe_mutation::annotations::{MESH_PROXY_VERSION, PROBES_REWRITTEN};
use meshprobe_mutation::{MutatorPipeline, ProbeRewriter, RewriterConfig};
use meshprobe_webhook::webhook::pod::review_pod;
use meshprobe_webhook::webhook::{webhook_router, WebhookState};
use serde_json::{json, Value};
use tower::ServiceExt;

const UID: &str = "7c1f6e52-1b1e-4b8e-9d0a-2f4f3b0a9e11";

fn pipeline() -> MutatorPipeline {
    MutatorPipeline::new().with(ProbeRewriter::new(RewriterConfig::default()))
}

fn web_pod(mesh: bool) -> Pod {
    let mut pod = Pod {
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "web".to_string(),
                image: Some("nginx:1.27".to_string()),
                ports: Some(vec![ContainerPort {
                    name: Some("http".to_string()),
                    container_port: 8080,
                    ..Default::default()
                }]),
                liveness_probe: Some(Probe {
                    http_get: Some(HTTPGetAction {
                        path: Some("/livez".to_string()),
                        port: IntOrString::String("http".to_string()),
                        ..Default::default()
                    }),
                    period_seconds: Some(5),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    };
    pod.metadata.generate_name = Some("web-5d8c7b9f4-".to_string());
    pod.metadata.namespace = Some("shop".to_string());
    if mesh {
        pod.metadata.annotations = Some(
            [(MESH_PROXY_VERSION.to_string(), "stable-2.14.10".to_string())]
                .into_iter()
                .collect(),
        );
    }
    pod
}

fn review_json(pod: &Pod) -> Value {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": UID,
            "kind": {"group": "", "version": "v1", "kind": "Pod"},
            "resource": {"group": "", "version": "v1", "resource": "pods"},
            "namespace": "shop",
            "operation": "CREATE",
            "userInfo": {"username": "system:serviceaccount:kube-system:replicaset-controller"},
            "object": pod,
            "dryRun": false
        }
    })
}

fn request(pod: &Pod) -> AdmissionRequest<Pod> {
    let review: AdmissionReview<Pod> = serde_json::from_value(review_json(pod)).unwrap();
    review.try_into().unwrap()
}

async fn post_review(body: Value) -> Value {
    let router = webhook_router(Arc::new(WebhookState::new(pipeline())));

    let request = Request::builder()
        .method("POST")
        .uri("/mutate/pods")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Story: the returned patch moves the HTTP probe onto a curl helper
#[test]
fn story_patch_rewrites_mesh_pod() {
    let pod = web_pod(true);
    let response = review_pod(&pipeline(), &request(&pod)).unwrap();
    assert!(response.allowed);

    let patch: json_patch::Patch =
        serde_json::from_slice(response.patch.as_deref().expect("patch expected")).unwrap();

    let mut doc = serde_json::to_value(&pod).unwrap();
    json_patch::patch(&mut doc, &patch.0).unwrap();
    let patched: Pod = serde_json::from_value(doc).unwrap();

    let containers = &patched.spec.as_ref().unwrap().containers;
    assert_eq!(containers.len(), 2);
    assert!(containers[0].liveness_probe.is_none());
    assert_eq!(containers[1].name, "local-curl-probe-web");

    let command = containers[1]
        .liveness_probe
        .as_ref()
        .and_then(|p| p.exec.as_ref())
        .and_then(|e| e.command.clone())
        .unwrap();
    assert_eq!(
        command,
        vec![
            "curl",
            "http://127.0.0.1:8080/livez",
            "--fail",
            "-o",
            "/dev/null"
        ]
    );

    let annotations = patched.metadata.annotations.unwrap();
    assert_eq!(
        annotations.get(PROBES_REWRITTEN).map(String::as_str),
        Some("yes")
    );
    assert!(annotations.contains_key("valewood.org/lcp-olp-web"));
}

/// Story: pods outside the mesh are admitted without a patch
#[test]
fn story_non_mesh_pod_not_patched() {
    let response = review_pod(&pipeline(), &request(&web_pod(false))).unwrap();
    assert!(response.allowed);
    assert!(response.patch.is_none());
}

/// Story: re-admitting an already rewritten pod produces no patch
#[test]
fn story_rewritten_pod_not_patched_again() {
    let pod = web_pod(true);
    let first = review_pod(&pipeline(), &request(&pod)).unwrap();
    let patch: json_patch::Patch = serde_json::from_slice(first.patch.as_deref().unwrap()).unwrap();

    let mut doc = serde_json::to_value(&pod).unwrap();
    json_patch::patch(&mut doc, &patch.0).unwrap();
    let rewritten: Pod = serde_json::from_value(doc).unwrap();

    let second = review_pod(&pipeline(), &request(&rewritten)).unwrap();
    assert!(second.allowed);
    assert!(second.patch.is_none());
}

/// Integration test: the HTTP endpoint answers with a JSONPatch review
#[tokio::test]
async fn integration_mutate_endpoint_returns_patch() {
    let review = post_review(review_json(&web_pod(true))).await;

    assert_eq!(review["apiVersion"], "admission.k8s.io/v1");
    assert_eq!(review["kind"], "AdmissionReview");
    assert_eq!(review["response"]["uid"], UID);
    assert_eq!(review["response"]["allowed"], true);
    assert_eq!(review["response"]["patchType"], "JSONPatch");
    assert!(!review["response"]["patch"].is_null());
}

/// Integration test: non-mesh pods are allowed without a patch
#[tokio::test]
async fn integration_mutate_endpoint_allows_non_mesh_pod() {
    let review = post_review(review_json(&web_pod(false))).await;

    assert_eq!(review["response"]["uid"], UID);
    assert_eq!(review["response"]["allowed"], true);
    assert!(review["response"]["patch"].is_null());
}

/// Integration test: a review without a request is answered as invalid
#[tokio::test]
async fn integration_mutate_endpoint_rejects_missing_request() {
    let review = post_review(json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview"
    }))
    .await;

    assert_eq!(review["response"]["allowed"], false);
}
